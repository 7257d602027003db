//! Sketch pad command.
//!
//! Opens the drawing surface in the terminal. Mouse drags paint strokes,
//! 's' saves a PNG next to the current directory, and Enter exports the
//! sketch as base64 to stdout (or a file) after the screen closes.

use std::path::PathBuf;

use crate::canvas::SketchPad;
use crate::config::BedtimeConfig;
use crate::ui::{DrawCommand, DrawTui};

/// Handles the interactive sketch pad.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the terminal UI cannot be initialized
pub async fn handle_draw(output: Option<String>) -> Result<(), anyhow::Error> {
    tracing::info!("=== bedtime sketch pad started ===");

    let config = BedtimeConfig::load_or_init()?;
    tracing::info!(
        "Canvas configured: {}x{}, stroke width {}",
        config.canvas.width,
        config.canvas.height,
        config.canvas.stroke_width
    );

    let mut pad = SketchPad::new(
        config.canvas.width,
        config.canvas.height,
        config.canvas.stroke_width,
        PathBuf::from(&config.canvas.download_file),
    );

    let mut tui = DrawTui::new(config.canvas.width, config.canvas.height)
        .map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    let mut exported: Option<String> = None;

    loop {
        match tui.handle_input(&mut pad) {
            Ok(DrawCommand::Clear) => {
                pad.clear();
                tui.set_status("cleared");
            }
            Ok(DrawCommand::Save) => {
                if pad.has_content() {
                    pad.download();
                    tui.set_status(format!("saved {}", config.canvas.download_file));
                } else {
                    tui.set_status("nothing to save");
                }
            }
            Ok(DrawCommand::Export) => {
                match pad.export_base64() {
                    Some(payload) => {
                        exported = Some(payload);
                        tui.set_status("exported, quit to print");
                    }
                    None => tui.set_status("nothing to export"),
                }
            }
            Ok(DrawCommand::Cancel) => break,
            Ok(DrawCommand::Continue) => {}
            Err(e) => {
                tracing::error!("Input handling error: {}", e);
                tui.cleanup().ok();
                return Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        }

        tui.render(&pad)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;
    }

    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    if let Some(payload) = exported {
        super::deliver_payload(&payload, output.as_deref())?;
    } else {
        tracing::info!("No sketch exported");
    }

    tracing::info!("=== bedtime sketch pad exited ===");
    Ok(())
}
