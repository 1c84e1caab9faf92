use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub requests: RequestsConfig,
    pub drive: DriveConfig,
    pub session: SessionConfig,
    pub model: ModelConfig,
    pub audio: AudioConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub ipv4: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestsConfig {
    pub timeout_secs: u64,
}

/// Speed and turn ranges of the car firmware. The range check assumes
/// `max_backward < standard_backward <= 0 <= standard_forward < max_forward`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    pub max_forward: i32,
    pub standard_forward: i32,
    pub max_backward: i32,
    pub standard_backward: i32,
    pub stop: i32,
    pub max_turn_right: i32,
    pub slight_turn_right: i32,
    pub max_turn_left: i32,
    pub slight_turn_left: i32,
    pub center: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub duration_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: String,
    pub input_width: usize,
    pub input_height: usize,
    pub num_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub enabled: bool,
    pub fast_track: String,
    pub calm_track: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}
