// src/command.rs

use tracing::warn;

/// Motor-control instructions understood by the car firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringCommand {
    Stop,
    Forward,
    Back,
    Right,
    SlightRight,
    Left,
    SlightLeft,
    CenterWheels,
    Start,
}

/// The classifier's discrete judgement about one camera frame.
/// `NoDetection` means the frame carried no usable driving signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictedClass {
    Forward,
    Back,
    Right,
    Left,
    SlightRight,
    SlightLeft,
    NoDetection,
}

impl PredictedClass {
    /// Map an argmax index of the model output to a class. The index order
    /// is fixed by the trained model; anything outside it degrades to
    /// `NoDetection`.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Forward,
            1 => Self::Back,
            2 => Self::Right,
            3 => Self::Left,
            4 => Self::SlightRight,
            5 => Self::SlightLeft,
            6 => Self::NoDetection,
            _ => {
                warn!("Unknown class index {index}, treating as no detection");
                Self::NoDetection
            }
        }
    }

    /// The steering command a confident prediction maps to. `NoDetection`
    /// carries no intent of its own; the debounce logic decides instead.
    pub fn steering_command(self) -> Option<SteeringCommand> {
        match self {
            Self::Forward => Some(SteeringCommand::Forward),
            Self::Back => Some(SteeringCommand::Back),
            Self::Right => Some(SteeringCommand::Right),
            Self::Left => Some(SteeringCommand::Left),
            Self::SlightRight => Some(SteeringCommand::SlightRight),
            Self::SlightLeft => Some(SteeringCommand::SlightLeft),
            Self::NoDetection => None,
        }
    }
}
