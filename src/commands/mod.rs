//! Application command handlers for bedtime.
//!
//! This module organizes command handling into separate submodules, each
//! responsible for a specific application command.
//!
//! # Commands
//! - `record`: Audio capture with countdown and base64 export
//! - `draw`: Freehand drawing surface with PNG/base64 export
//! - `replay`: Play back the last recording preview
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod draw;
pub mod list_devices;
pub mod logs;
pub mod record;
pub mod replay;

pub use config::handle_config;
pub use draw::handle_draw;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use record::handle_record;
pub use replay::handle_replay;

use anyhow::anyhow;
use std::path::PathBuf;

/// Where the playback preview of the last recording lives.
///
/// # Errors
/// - If the home directory cannot be determined
pub(crate) fn preview_wav_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("bedtime");
    Ok(data_dir.join("last-recording.wav"))
}

/// Writes a payload to a file, or to stdout when no file was requested.
///
/// # Errors
/// - If the output file cannot be written
pub(crate) fn deliver_payload(payload: &str, output: Option<&str>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, payload)
                .map_err(|e| anyhow!("failed to write output file {path}: {e}"))?;
            tracing::info!("Payload written to {path} ({} bytes)", payload.len());
        }
        None => {
            println!("{payload}");
        }
    }
    Ok(())
}
