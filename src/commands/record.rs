//! Audio capture command.
//!
//! Runs the capture screen: Space toggles the session, the countdown and
//! level meter track progress, and the finished artifact is printed as
//! base64 to stdout (or a file) after the screen closes. Supports external
//! stop triggers via SIGUSR1.

use std::cell::RefCell;
use std::rc::Rc;

use crate::capture::{CaptureSession, CpalCaptureDevice, SessionEvent, SystemClock};
use crate::config::BedtimeConfig;
use crate::ui::{show_notice, RecordCommand, RecordTui};
use crate::words::{SplitMix64, WordField};

/// Handles audio capture with countdown and base64 delivery.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the terminal UI cannot be initialized
pub async fn handle_record(output: Option<String>) -> Result<(), anyhow::Error> {
    tracing::info!("=== bedtime capture started ===");

    let config = match BedtimeConfig::load_or_init() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            show_notice(&format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/bedtime/bedtime.toml file and try again."
            ))?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, max_duration={}s",
        config.audio.device,
        config.audio.sample_rate,
        config.audio.max_duration_secs
    );

    let device = CpalCaptureDevice::new(config.audio.device.clone(), config.audio.sample_rate);
    let mut session = CaptureSession::new(device, SystemClock, config.audio.max_duration_secs);

    match super::preview_wav_path() {
        Ok(path) => session.set_preview_path(path),
        Err(e) => tracing::warn!("No preview path available: {e}"),
    }

    // The callback fires inside stop(); the payload is delivered to
    // stdout/file after the alternate screen is gone.
    let payload_sink: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&payload_sink);
    session.set_on_complete(Box::new(move |base64| {
        *sink.borrow_mut() = Some(base64);
    }));

    let mut rng = SplitMix64::from_entropy();
    let word_field = WordField::generate(config.words.visible_count, &mut rng);

    let mut tui = RecordTui::new(config.audio.sample_rate, word_field)
        .map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    let external_stop = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, external_stop.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    tracing::debug!("Entering capture loop. Space toggles, 'q'/Escape quits.");

    loop {
        if external_stop.swap(false, std::sync::atomic::Ordering::Relaxed)
            && session.is_recording()
        {
            tracing::info!("Received SIGUSR1: stopping via external trigger");
            session.stop();
            tui.set_status("stopped by external trigger");
        }

        match tui.handle_input() {
            Ok(RecordCommand::Toggle) => {
                let was_recording = session.is_recording();
                if let Err(e) = session.toggle() {
                    // Unsupported/denied capture is terminal for this
                    // attempt; the user retries manually
                    tracing::error!("Failed to start capture: {e}");
                    tui.cleanup().ok();
                    show_notice(&format!(
                        "Recording Error:\n\n{e}\n\nPlease check your microphone and audio configuration, then try again."
                    ))?;
                    return Ok(());
                }
                if was_recording {
                    tui.set_status("recording complete");
                }
            }
            Ok(RecordCommand::Cancel) => {
                break;
            }
            Ok(RecordCommand::Continue) => {}
            Err(e) => {
                tracing::error!("Input handling error: {}", e);
                tui.cleanup().ok();
                return Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        }

        for event in session.poll() {
            match event {
                SessionEvent::AutoStopped { delivered } => {
                    tui.set_status(if delivered {
                        "recording complete"
                    } else {
                        "recording stopped, nothing captured"
                    });
                }
                SessionEvent::DeviceFault(message) => {
                    tui.set_status(format!("microphone fault: {message}"));
                }
            }
        }

        let samples = session.live_samples();
        tui.render(session.is_recording(), session.remaining_secs(), &samples)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;
    }

    // Teardown releases the microphone and timers even mid-recording
    drop(session);
    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    if let Some(payload) = payload_sink.borrow_mut().take() {
        if let Some(url) = config.proxy.forward_url(&config.proxy.path_prefix) {
            tracing::debug!("Payload ready for {url}");
        }
        super::deliver_payload(&payload, output.as_deref())?;
    } else {
        tracing::info!("No recording completed");
    }

    tracing::info!("=== bedtime capture exited ===");
    Ok(())
}
