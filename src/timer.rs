// src/timer.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// Counts down the session on its own thread and raises the exit flag
/// exactly once. Nothing is interrupted preemptively: the control loop
/// observes the flag at its next loop-top check.
pub struct SessionTimer {
    duration: Duration,
    exit: Arc<AtomicBool>,
}

impl SessionTimer {
    pub fn new(duration: Duration, exit: Arc<AtomicBool>) -> Self {
        Self { duration, exit }
    }

    pub fn run(self) {
        info!("Timer has started, time to count: {:?}", self.duration);
        thread::sleep(self.duration);
        info!("Time is out");
        self.exit.store(true, Ordering::SeqCst);
    }
}
