// src/bin/capture.rs
//
// Dataset helper: grab one photo from the car's camera and store it under
// dataset/<label>/, named by local time. Point the camera at the scene and
// run with the label you are collecting.

use anyhow::Result;
use car_pilot::communicator::Communicator;
use car_pilot::types::Config;
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("car_pilot=info"))
        .init();

    let label = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "unsorted".to_string());
    let config = Config::load("config.yaml")?;

    let mut communicator = Communicator::new(&config)?;
    let path = communicator.save_photo(Path::new("dataset"), &label)?;
    println!("{}", path.display());
    Ok(())
}
