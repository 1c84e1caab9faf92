// src/protocol.rs
//
// Command-to-wire mapping for the car's /drive endpoint. The firmware
// encodes the steering zero-point at +8, so every turn value is corrected
// by the offset before transmission.

use crate::command::SteeringCommand;
use crate::types::DriveConfig;

/// Fabric setting of the steering hardware: turn = 8 straightens the wheels.
pub const TURN_OFFSET: i32 = 8;

/// A parameter ready for the wire: the speed or the turn form of /drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireCommand {
    Speed(i32),
    Steer(i32),
}

/// Pure mapping from a steering command to its wire parameter. Turn values
/// (including centering) leave here already offset-corrected.
pub fn to_wire(command: SteeringCommand, drive: &DriveConfig) -> WireCommand {
    match command {
        SteeringCommand::Start | SteeringCommand::Forward => {
            WireCommand::Speed(drive.standard_forward)
        }
        SteeringCommand::Back => WireCommand::Speed(drive.standard_backward),
        SteeringCommand::Stop => WireCommand::Speed(drive.stop),
        SteeringCommand::Right => WireCommand::Steer(drive.max_turn_right + TURN_OFFSET),
        SteeringCommand::SlightRight => WireCommand::Steer(drive.slight_turn_right + TURN_OFFSET),
        SteeringCommand::Left => WireCommand::Steer(drive.max_turn_left + TURN_OFFSET),
        SteeringCommand::SlightLeft => WireCommand::Steer(drive.slight_turn_left + TURN_OFFSET),
        SteeringCommand::CenterWheels => WireCommand::Steer(drive.center + TURN_OFFSET),
    }
}

/// Strict range gate for the speed form. The planner drops speeds at or
/// beyond the limits without sending anything.
pub fn speed_in_range(speed: i32, drive: &DriveConfig) -> bool {
    drive.max_backward < speed && speed < drive.max_forward
}
