//! Replay the last captured recording using the system audio player.

use std::process::Command;

/// Plays back the preview WAV written by the last completed capture.
///
/// On macOS: Uses `open` command to open with default application
/// On Linux: Tries xdg-open first, then falls back to common audio players (mpv, vlc, ffplay, paplay)
pub async fn handle_replay() -> Result<(), anyhow::Error> {
    tracing::info!("=== bedtime Replay Command ===");

    let audio_path = super::preview_wav_path()?;

    if !audio_path.exists() {
        return Err(anyhow::anyhow!(
            "No recording found at {}. Run `bedtime record` first.",
            audio_path.display()
        ));
    }

    tracing::info!("Playing {}", audio_path.display());

    // Platform-specific audio player invocation
    #[cfg(target_os = "macos")]
    {
        Command::new("open")
            .arg(&audio_path)
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to open audio player: {e}"))?
            .wait()
            .map_err(|e| anyhow::anyhow!("Audio player error: {e}"))?;
    }

    #[cfg(target_os = "linux")]
    {
        let result = Command::new("xdg-open").arg(&audio_path).spawn();

        match result {
            Ok(mut child) => {
                child
                    .wait()
                    .map_err(|e| anyhow::anyhow!("Audio player error: {e}"))?;
            }
            Err(_) => {
                // Fallback to common audio players if xdg-open fails
                let players = vec!["mpv", "vlc", "ffplay", "paplay"];
                let mut played = false;

                for player in players {
                    if let Ok(mut child) = Command::new(player).arg(&audio_path).spawn() {
                        let _ = child.wait();
                        played = true;
                        break;
                    }
                }

                if !played {
                    return Err(anyhow::anyhow!(
                        "No audio player found. Install mpv, vlc, ffplay, or paplay"
                    ));
                }
            }
        }
    }

    tracing::info!("Playback finished");
    Ok(())
}
