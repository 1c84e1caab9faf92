// src/music.rs
//
// Soundtrack sidecar. Runs on a detached thread the session never waits
// on; playback failures are logged and swallowed, never touching the
// drive path.

use crate::types::{AudioConfig, DriveConfig};
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::thread;
use tracing::{info, warn};

/// Aggressive sessions (standard speed at least half of max) get the fast
/// track, everything else the calm one.
pub fn select_track<'a>(drive: &DriveConfig, audio: &'a AudioConfig) -> &'a str {
    if 2 * drive.standard_forward >= drive.max_forward {
        &audio.fast_track
    } else {
        &audio.calm_track
    }
}

/// Spawn the player detached; it ends with the process.
pub fn spawn_player(drive: &DriveConfig, audio: &AudioConfig) {
    let track = select_track(drive, audio).to_owned();
    thread::spawn(move || {
        info!("Playing soundtrack: {track}");
        if let Err(e) = play_on_loop(&track) {
            warn!("Soundtrack playback failed: {e:#}");
        }
    });
}

fn play_on_loop(track: &str) -> Result<()> {
    let (_stream, handle) = OutputStream::try_default().context("No audio output device")?;
    let sink = Sink::try_new(&handle).context("Failed to open audio sink")?;
    let file = File::open(track).with_context(|| format!("Failed to open {track}"))?;
    let source = Decoder::new(BufReader::new(file)).context("Failed to decode soundtrack")?;
    sink.append(source.repeat_infinite());
    sink.sleep_until_end();
    Ok(())
}
