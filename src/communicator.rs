// src/communicator.rs
//
// HTTP link between the controlling computer and the robotic car. Every
// steering command is first planned against an explicit drive-state table,
// so redundant forward requests are suppressed and each request the car
// receives can be read off the table. Dispatch is best-effort: a timed-out
// request is logged and abandoned, never retried.

use crate::command::SteeringCommand;
use crate::protocol::{self, WireCommand};
use crate::types::{Config, DriveConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Mechanical steering settle time: the wheels need a moment to actuate
/// before the next request is safe to send. Slept on the calling thread,
/// so it is part of the cycle latency.
pub const TURN_SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Device seam of the control loop. The production implementation is
/// [`Communicator`]; session tests substitute a scripted car.
pub trait CarLink {
    fn send_command(&mut self, command: SteeringCommand);
    fn take_photo(&mut self) -> Option<Vec<u8>>;
    fn last_command(&self) -> Option<SteeringCommand>;
}

/// One request the planner decided to transmit. `settle` marks turn
/// requests that must wait out [`TURN_SETTLE_DELAY`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedRequest {
    pub wire: WireCommand,
    pub settle: bool,
}

impl PlannedRequest {
    fn immediate(wire: WireCommand) -> Self {
        Self {
            wire,
            settle: false,
        }
    }
}

/// Driving/centering flags of the car as this side believes them to be.
/// Mutated only by [`DriveState::plan`], on the control-loop thread, and
/// never reset mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveState {
    wheels_centered: bool,
    driving_forward: bool,
    driving_backward: bool,
    last_command: Option<SteeringCommand>,
}

impl Default for DriveState {
    fn default() -> Self {
        Self {
            wheels_centered: true,
            driving_forward: false,
            driving_backward: false,
            last_command: None,
        }
    }
}

impl DriveState {
    /// Transition table: which wire requests a steering command produces in
    /// the current state, updating the flags in the same step.
    ///
    /// Asymmetries preserved from the car's observed behavior: forward is
    /// suppressed while already driving forward, backward is re-sent every
    /// time, and `Stop` leaves the direction flags alone (a stop is a
    /// momentary halt, not a direction change).
    pub fn plan(&mut self, command: SteeringCommand, drive: &DriveConfig) -> Vec<PlannedRequest> {
        let mut requests = Vec::new();
        match command {
            SteeringCommand::Start | SteeringCommand::Forward => {
                if !self.wheels_centered {
                    requests.push(PlannedRequest::immediate(protocol::to_wire(
                        SteeringCommand::CenterWheels,
                        drive,
                    )));
                    self.wheels_centered = true;
                }
                if !self.driving_forward && protocol::speed_in_range(drive.standard_forward, drive)
                {
                    requests.push(PlannedRequest::immediate(protocol::to_wire(
                        SteeringCommand::Forward,
                        drive,
                    )));
                    self.driving_forward = true;
                    self.driving_backward = false;
                }
            }
            SteeringCommand::Back => {
                if protocol::speed_in_range(drive.standard_backward, drive) {
                    requests.push(PlannedRequest::immediate(protocol::to_wire(
                        SteeringCommand::Back,
                        drive,
                    )));
                    self.driving_backward = true;
                    self.driving_forward = false;
                }
            }
            SteeringCommand::Right
            | SteeringCommand::SlightRight
            | SteeringCommand::Left
            | SteeringCommand::SlightLeft => {
                self.wheels_centered = false;
                requests.push(PlannedRequest {
                    wire: protocol::to_wire(command, drive),
                    settle: true,
                });
            }
            SteeringCommand::CenterWheels => {
                self.wheels_centered = true;
                requests.push(PlannedRequest::immediate(protocol::to_wire(
                    SteeringCommand::CenterWheels,
                    drive,
                )));
            }
            SteeringCommand::Stop => {
                requests.push(PlannedRequest::immediate(protocol::to_wire(
                    SteeringCommand::Stop,
                    drive,
                )));
            }
        }
        if !requests.is_empty() {
            self.last_command = Some(command);
        }
        requests
    }

    pub fn wheels_centered(&self) -> bool {
        self.wheels_centered
    }

    pub fn driving_forward(&self) -> bool {
        self.driving_forward
    }

    pub fn driving_backward(&self) -> bool {
        self.driving_backward
    }

    pub fn last_command(&self) -> Option<SteeringCommand> {
        self.last_command
    }
}

/// Talks to the car firmware over its fixed HTTP protocol:
/// `GET /drive?speed=<int>`, `GET /drive?turn=<int>`, `GET /photo`.
pub struct Communicator {
    http: reqwest::blocking::Client,
    drive_url: String,
    turn_url: String,
    photo_url: String,
    drive: DriveConfig,
    state: DriveState,
}

impl Communicator {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.requests.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let base = format!("http://{}", config.network.ipv4);
        Ok(Self {
            http,
            drive_url: format!("{base}/drive?speed="),
            turn_url: format!("{base}/drive?turn="),
            photo_url: format!("{base}/photo"),
            drive: config.drive.clone(),
            state: DriveState::default(),
        })
    }

    /// Plan the command against the drive state, then transmit each
    /// resulting request. Turn requests wait out the settle delay first.
    pub fn send_command(&mut self, command: SteeringCommand) {
        for request in self.state.plan(command, &self.drive) {
            if request.settle {
                thread::sleep(TURN_SETTLE_DELAY);
            }
            let url = match request.wire {
                WireCommand::Speed(value) => format!("{}{}", self.drive_url, value),
                WireCommand::Steer(value) => format!("{}{}", self.turn_url, value),
            };
            self.send_get(&url);
        }
    }

    // Fail-soft: a lost command must not stall or crash the control loop.
    fn send_get(&self, url: &str) {
        if let Err(e) = self.http.get(url).send() {
            warn!("TIMEOUT when sending {url} request: {e}");
        }
    }

    /// Fetch one JPEG from the car's camera. `None` on timeout or any
    /// non-200 answer; the caller skips the cycle.
    pub fn take_photo(&mut self) -> Option<Vec<u8>> {
        match self.http.get(&self.photo_url).send() {
            Ok(response) if response.status().is_success() => match response.bytes() {
                Ok(bytes) => Some(bytes.to_vec()),
                Err(e) => {
                    warn!("Failed to read photo body: {e}");
                    None
                }
            },
            Ok(response) => {
                warn!("Photo endpoint returned {}", response.status());
                None
            }
            Err(e) => {
                warn!("TIMEOUT during taking picture: {e}");
                None
            }
        }
    }

    pub fn last_command(&self) -> Option<SteeringCommand> {
        self.state.last_command()
    }

    pub fn drive_state(&self) -> &DriveState {
        &self.state
    }

    /// Fetch one photo and store it under `dataset_dir/subdirectory`,
    /// named by local time. Used for building training datasets.
    pub fn save_photo(&mut self, dataset_dir: &Path, subdirectory: &str) -> Result<PathBuf> {
        let bytes = self
            .take_photo()
            .context("Didn't receive a photo from the car")?;
        let dir = dataset_dir.join(subdirectory);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let stamp = chrono::Local::now().format("%Y_%m_%d_%H_%M_%S");
        let path = dir.join(format!("img_{stamp}.jpg"));
        fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved photo: {}", path.display());
        Ok(path)
    }
}

impl CarLink for Communicator {
    fn send_command(&mut self, command: SteeringCommand) {
        Communicator::send_command(self, command);
    }

    fn take_photo(&mut self) -> Option<Vec<u8>> {
        Communicator::take_photo(self)
    }

    fn last_command(&self) -> Option<SteeringCommand> {
        Communicator::last_command(self)
    }
}
