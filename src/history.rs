// src/history.rs

use crate::command::PredictedClass;
use std::collections::VecDeque;

const DEPTH: usize = 2;

/// Newest-first buffer of the last two predictions. Debounces "no
/// detection" frames: one ambiguous frame keeps the previous intent alive,
/// two in a row stop the car.
#[derive(Debug, Default)]
pub struct PredictionHistory {
    entries: VecDeque<PredictedClass>,
}

impl PredictionHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(DEPTH),
        }
    }

    /// Insert the freshest prediction, evicting the oldest past depth 2.
    pub fn push(&mut self, class: PredictedClass) {
        self.entries.push_front(class);
        self.entries.truncate(DEPTH);
    }

    pub fn latest(&self) -> Option<PredictedClass> {
        self.entries.front().copied()
    }

    /// The entry pushed before the latest one.
    pub fn previous(&self) -> Option<PredictedClass> {
        self.entries.get(1).copied()
    }

    /// True when every held entry is `NoDetection`. A single such entry
    /// already qualifies, so the very first ambiguous frame of a session
    /// stops the car rather than inventing an intent.
    pub fn all_no_detection(&self) -> bool {
        self.entries
            .iter()
            .all(|class| *class == PredictedClass::NoDetection)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
