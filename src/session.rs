// src/session.rs
//
// The driving session: perception → decision → action cycles bounded by
// the timer. The loop, the timer, and the optional soundtrack run on
// their own threads; the only synchronization point is the write-once
// exit flag, polled at loop-top granularity.

use crate::classifier::{Classifier, OnnxClassifier};
use crate::command::{PredictedClass, SteeringCommand};
use crate::communicator::{CarLink, Communicator};
use crate::history::PredictionHistory;
use crate::music;
use crate::timer::SessionTimer;
use crate::types::Config;
use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// One driving session: owns the control loop and the debounce history.
/// Built once, run once, not reused.
pub struct Session<D: CarLink, C: Classifier> {
    device: D,
    classifier: C,
    history: PredictionHistory,
    exit: Arc<AtomicBool>,
    state: SessionState,
}

impl<D: CarLink, C: Classifier> Session<D, C> {
    pub fn new(device: D, classifier: C, exit: Arc<AtomicBool>) -> Self {
        Self {
            device,
            classifier,
            history: PredictionHistory::new(),
            exit,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the control loop until the exit flag is set. The flag is only
    /// observed at the top of the loop, so a cycle in flight runs to
    /// completion. On exit the car is left stopped with wheels centered.
    pub fn run(&mut self) {
        info!("Starting main loop of application");
        self.state = SessionState::Running;
        self.device.send_command(SteeringCommand::CenterWheels);

        while !self.exit.load(Ordering::SeqCst) {
            self.cycle();
        }

        self.device.send_command(SteeringCommand::Stop);
        self.device.send_command(SteeringCommand::CenterWheels);
        self.state = SessionState::Finished;
        info!("Session finished");
    }

    // A missing photo or a classifier failure skips the cycle: no history
    // entry, no command. Never fatal.
    fn cycle(&mut self) {
        let Some(photo) = self.device.take_photo() else {
            warn!("No response, skipping cycle");
            return;
        };
        let predicted = match self.classifier.classify(&photo) {
            Ok(predicted) => predicted,
            Err(e) => {
                warn!("Classifier failed: {e:#}, skipping cycle");
                return;
            }
        };
        debug!("Predicted class: {predicted:?}");
        self.history.push(predicted);
        self.steer(predicted);
    }

    /// Decision logic: a confident prediction steers directly. A single
    /// ambiguous frame re-sends the previous intent; two in a row stop
    /// the car.
    fn steer(&mut self, predicted: PredictedClass) {
        if let Some(command) = predicted.steering_command() {
            self.device.send_command(command);
            return;
        }
        if self.history.all_no_detection() {
            self.device.send_command(SteeringCommand::Stop);
        } else if let Some(command) = self
            .history
            .previous()
            .and_then(PredictedClass::steering_command)
        {
            self.device.send_command(command);
        }
    }
}

/// Wire a full driving session from the loaded configuration. The control
/// loop and the timer race on their own threads; the soundtrack, when
/// enabled, is spawned detached and never joined.
pub fn run_session(config: Config) -> Result<()> {
    let communicator = Communicator::new(&config)?;
    info!("✓ Communicator ready");
    let classifier = OnnxClassifier::new(&config.model)?;
    info!("✓ Classifier ready");

    let exit = Arc::new(AtomicBool::new(false));
    let timer = SessionTimer::new(
        Duration::from_secs(config.session.duration_secs),
        Arc::clone(&exit),
    );

    if config.audio.enabled {
        music::spawn_player(&config.drive, &config.audio);
    }

    let mut session = Session::new(communicator, classifier, Arc::clone(&exit));
    let control = thread::spawn(move || session.run());
    let timer_thread = thread::spawn(move || timer.run());

    control
        .join()
        .map_err(|_| anyhow!("Control loop thread panicked"))?;
    timer_thread
        .join()
        .map_err(|_| anyhow!("Timer thread panicked"))?;

    info!("Program has finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::PredictedClass::NoDetection;
    use crate::command::SteeringCommand::*;

    const PHOTO: &[u8] = &[0xff, 0xd8, 0xff];

    /// Plays back a fixed photo script, then raises the exit flag so the
    /// loop winds down after the last scripted cycle.
    struct ScriptedCar {
        photos: Vec<Option<Vec<u8>>>,
        cursor: usize,
        sent: Vec<SteeringCommand>,
        exit: Arc<AtomicBool>,
    }

    impl ScriptedCar {
        fn new(photos: Vec<Option<Vec<u8>>>, exit: Arc<AtomicBool>) -> Self {
            Self {
                photos,
                cursor: 0,
                sent: Vec::new(),
                exit,
            }
        }
    }

    impl CarLink for ScriptedCar {
        fn send_command(&mut self, command: SteeringCommand) {
            self.sent.push(command);
        }

        fn take_photo(&mut self) -> Option<Vec<u8>> {
            let photo = self.photos.get(self.cursor).cloned().flatten();
            self.cursor += 1;
            if self.cursor >= self.photos.len() {
                self.exit.store(true, Ordering::SeqCst);
            }
            photo
        }

        fn last_command(&self) -> Option<SteeringCommand> {
            self.sent.last().copied()
        }
    }

    /// Always has a photo; models network latency so the timer test does
    /// not spin millions of cycles.
    struct EndlessCar {
        sent: Vec<SteeringCommand>,
    }

    impl CarLink for EndlessCar {
        fn send_command(&mut self, command: SteeringCommand) {
            self.sent.push(command);
        }

        fn take_photo(&mut self) -> Option<Vec<u8>> {
            thread::sleep(Duration::from_millis(1));
            Some(PHOTO.to_vec())
        }

        fn last_command(&self) -> Option<SteeringCommand> {
            self.sent.last().copied()
        }
    }

    struct ScriptedClassifier {
        classes: Vec<anyhow::Result<PredictedClass>>,
        cursor: usize,
        calls: usize,
    }

    impl ScriptedClassifier {
        fn new(classes: Vec<PredictedClass>) -> Self {
            Self::from_results(classes.into_iter().map(Ok).collect())
        }

        fn from_results(classes: Vec<anyhow::Result<PredictedClass>>) -> Self {
            Self {
                classes,
                cursor: 0,
                calls: 0,
            }
        }
    }

    impl Classifier for ScriptedClassifier {
        fn classify(&mut self, _jpeg: &[u8]) -> anyhow::Result<PredictedClass> {
            self.calls += 1;
            let class = match self.classes.get(self.cursor) {
                Some(Ok(class)) => Ok(*class),
                Some(Err(e)) => Err(anyhow!("{e}")),
                None => Ok(NoDetection),
            };
            self.cursor += 1;
            class
        }
    }

    fn photos(count: usize) -> Vec<Option<Vec<u8>>> {
        vec![Some(PHOTO.to_vec()); count]
    }

    #[test]
    fn test_one_ambiguous_frame_keeps_the_previous_intent() {
        let exit = Arc::new(AtomicBool::new(false));
        let car = ScriptedCar::new(photos(4), Arc::clone(&exit));
        let classifier = ScriptedClassifier::new(vec![
            PredictedClass::Forward,
            PredictedClass::Forward,
            NoDetection,
            NoDetection,
        ]);

        let mut session = Session::new(car, classifier, exit);
        assert_eq!(session.state(), SessionState::Idle);
        session.run();

        // Start bracket, one Forward per confident frame, the ambiguous
        // frame re-sends Forward, the second one stops, then the shutdown
        // bracket. Forward-repeat suppression happens below this seam, in
        // the communicator's drive-state table.
        assert_eq!(
            session.device.sent,
            vec![CenterWheels, Forward, Forward, Forward, Stop, Stop, CenterWheels]
        );
        assert_eq!(session.state(), SessionState::Finished);
    }

    #[test]
    fn test_directional_classes_steer_directly() {
        let exit = Arc::new(AtomicBool::new(false));
        let car = ScriptedCar::new(photos(3), Arc::clone(&exit));
        let classifier = ScriptedClassifier::new(vec![
            PredictedClass::Left,
            PredictedClass::SlightRight,
            PredictedClass::Back,
        ]);

        let mut session = Session::new(car, classifier, exit);
        session.run();

        assert_eq!(
            session.device.sent,
            vec![CenterWheels, Left, SlightRight, Back, Stop, CenterWheels]
        );
    }

    #[test]
    fn test_missing_photo_skips_the_cycle_entirely() {
        let exit = Arc::new(AtomicBool::new(false));
        let car = ScriptedCar::new(
            vec![Some(PHOTO.to_vec()), None, Some(PHOTO.to_vec())],
            Arc::clone(&exit),
        );
        let classifier =
            ScriptedClassifier::new(vec![PredictedClass::Forward, PredictedClass::Forward]);

        let mut session = Session::new(car, classifier, exit);
        session.run();

        // The failed fetch produced no classifier call and no command.
        assert_eq!(session.classifier.calls, 2);
        assert_eq!(
            session.device.sent,
            vec![CenterWheels, Forward, Forward, Stop, CenterWheels]
        );
    }

    #[test]
    fn test_classifier_failure_skips_the_cycle() {
        let exit = Arc::new(AtomicBool::new(false));
        let car = ScriptedCar::new(photos(3), Arc::clone(&exit));
        let classifier = ScriptedClassifier::from_results(vec![
            Ok(PredictedClass::Forward),
            Err(anyhow!("inference blew up")),
            Ok(NoDetection),
        ]);

        let mut session = Session::new(car, classifier, exit);
        session.run();

        // The failed cycle left no history entry, so the later ambiguous
        // frame still sees Forward as the previous intent.
        assert_eq!(session.classifier.calls, 3);
        assert_eq!(
            session.device.sent,
            vec![CenterWheels, Forward, Forward, Stop, CenterWheels]
        );
    }

    #[test]
    fn test_timer_bounds_the_session() {
        let exit = Arc::new(AtomicBool::new(false));
        let timer = SessionTimer::new(Duration::from_millis(150), Arc::clone(&exit));
        let car = EndlessCar { sent: Vec::new() };
        let classifier = ScriptedClassifier::new(vec![PredictedClass::Forward; 1000]);

        let mut session = Session::new(car, classifier, Arc::clone(&exit));
        let control = thread::spawn(move || {
            session.run();
            session
        });
        let timer_thread = thread::spawn(move || timer.run());

        let session = control.join().unwrap();
        timer_thread.join().unwrap();

        assert_eq!(session.state(), SessionState::Finished);
        let sent = &session.device.sent;
        assert_eq!(sent[0], CenterWheels);
        assert_eq!(&sent[sent.len() - 2..], &[Stop, CenterWheels]);
    }
}
