//! Capture device abstraction and the cpal-backed implementation.
//!
//! The session state machine talks to a [`CaptureDevice`] trait rather than
//! cpal directly so it can be driven in tests with a fake device. The
//! production implementation captures mono i16 PCM from the system's default
//! (or a named) input device, downmixing multi-channel audio in the stream
//! callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Errors surfaced at the capture boundary.
///
/// All of these are converted into user-visible notices by the command layer;
/// none of them crash the application.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The platform has no audio capture support at all.
    #[error("audio capture is not supported on this system")]
    UnsupportedPlatform,

    /// The OS or user refused access to the input device.
    #[error("microphone access denied: {0}")]
    PermissionDenied(String),

    /// The device exists but could not be opened or configured.
    #[error("could not acquire audio input device: {0}")]
    AcquisitionFailed(String),

    /// The device failed mid-session (hardware fault, stream died).
    #[error("audio device fault: {0}")]
    DeviceFault(String),

    /// The recorded artifact could not be serialized.
    #[error("failed to encode recording: {0}")]
    Encoding(String),
}

/// An exclusively-owned handle to a live audio input source.
///
/// Implementations must make `release` idempotent: the session calls it on
/// every exit path (manual stop, auto-stop, device fault, teardown) and a
/// double release must be safe.
pub trait CaptureDevice {
    /// Whether the platform can capture audio at all.
    fn is_supported(&self) -> bool;

    /// Opens the input stream and starts accumulating samples.
    ///
    /// # Errors
    /// - `PermissionDenied` if the OS refuses device access
    /// - `AcquisitionFailed` if the device cannot be opened or configured
    fn acquire(&mut self) -> Result<(), CaptureError>;

    /// Stops the stream and drops the hardware handle. Idempotent.
    fn release(&mut self);

    /// Whether a stream is currently held.
    fn is_held(&self) -> bool;

    /// Returns and clears a mid-session device fault, if one occurred.
    fn take_fault(&mut self) -> Option<String>;

    /// Returns a copy of all samples accumulated since `acquire`.
    fn samples(&self) -> Vec<i16>;

    /// Discards any accumulated samples.
    fn clear_samples(&mut self);

    /// The actual capture sample rate in Hz (valid after `acquire`).
    fn sample_rate(&self) -> u32;
}

/// Captures mono i16 PCM from a cpal input device.
pub struct CpalCaptureDevice {
    /// Device name, numeric index as a string, or "default"
    device_name: String,
    /// Actual sample rate reported by the device after acquisition
    sample_rate: u32,
    /// Accumulated mono samples, filled by the stream callback
    samples: Arc<Mutex<Vec<i16>>>,
    /// Mid-session stream error reported by the cpal error callback
    fault: Arc<Mutex<Option<String>>>,
    /// Active input stream (kept alive while recording)
    stream: Option<cpal::Stream>,
}

impl CpalCaptureDevice {
    /// Creates a device wrapper for the given device spec.
    ///
    /// # Arguments
    /// * `device_name` - "default", a device name, or a numeric index
    /// * `requested_sample_rate` - desired rate in Hz; the device's native
    ///   rate wins and is reported by `sample_rate()` after acquisition
    pub fn new(device_name: String, requested_sample_rate: u32) -> Self {
        Self {
            device_name,
            sample_rate: requested_sample_rate,
            samples: Arc::new(Mutex::new(Vec::new())),
            fault: Arc::new(Mutex::new(None)),
            stream: None,
        }
    }

    /// Downmixes an incoming buffer to mono and appends it to the
    /// accumulated samples.
    fn handle_audio_callback(
        data: &[i16],
        samples_arc: &Arc<Mutex<Vec<i16>>>,
        num_channels: usize,
    ) {
        let mut samples = samples_arc.lock().unwrap();

        match num_channels {
            1 => {
                samples.extend_from_slice(data);
            }
            2 => {
                for chunk in data.chunks_exact(2) {
                    let left = chunk[0] as i32;
                    let right = chunk[1] as i32;
                    samples.push(((left + right) / 2) as i16);
                }
            }
            _ => {
                for chunk in data.chunks_exact(num_channels) {
                    let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
                    samples.push((sum / num_channels as i32) as i16);
                }
            }
        }
    }
}

impl CaptureDevice for CpalCaptureDevice {
    fn is_supported(&self) -> bool {
        suppress_alsa_warnings(|| Ok(cpal::default_host().default_input_device().is_some()))
            .unwrap_or(false)
    }

    fn acquire(&mut self) -> Result<(), CaptureError> {
        // Re-acquisition while a stream is held would race for the hardware
        if self.stream.is_some() {
            tracing::warn!("acquire called while a stream is already held");
            return Ok(());
        }

        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if self.device_name == "default" {
                host.default_input_device()
                    .ok_or(CaptureError::UnsupportedPlatform)
            } else {
                find_device_by_name(&host, &self.device_name)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Capture device: {}", device_name);

        let device_config = device
            .default_input_config()
            .map_err(|e| classify_acquire_error(e.to_string()))?;
        let device_sample_rate = device_config.sample_rate().0;
        let num_channels = device_config.channels() as usize;

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            device_sample_rate,
            num_channels
        );

        self.sample_rate = device_sample_rate;
        self.samples.lock().unwrap().clear();
        *self.fault.lock().unwrap() = None;

        let samples_arc = Arc::clone(&self.samples);
        let fault_arc = Arc::clone(&self.fault);
        let callback_channels = num_channels;

        let stream = device
            .build_input_stream(
                &device_config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    Self::handle_audio_callback(data, &samples_arc, callback_channels);
                },
                move |err| {
                    tracing::error!("Audio stream error: {}", err);
                    *fault_arc.lock().unwrap() = Some(err.to_string());
                },
                None,
            )
            .map_err(|e| classify_acquire_error(e.to_string()))?;

        stream
            .play()
            .map_err(|e| CaptureError::AcquisitionFailed(e.to_string()))?;
        self.stream = Some(stream);

        tracing::debug!("Audio stream started");
        Ok(())
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            tracing::debug!("Audio stream released");
        }
    }

    fn is_held(&self) -> bool {
        self.stream.is_some()
    }

    fn take_fault(&mut self) -> Option<String> {
        self.fault.lock().unwrap().take()
    }

    fn samples(&self) -> Vec<i16> {
        self.samples.lock().unwrap().clone()
    }

    fn clear_samples(&mut self) {
        self.samples.lock().unwrap().clear();
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for CpalCaptureDevice {
    fn drop(&mut self) {
        self.release();
    }
}

/// Maps an acquisition failure message onto the error taxonomy.
///
/// cpal reports OS-level refusals as backend-specific errors; the only
/// portable signal is the message text.
fn classify_acquire_error(message: String) -> CaptureError {
    if message.to_lowercase().contains("permission") {
        CaptureError::PermissionDenied(message)
    } else {
        CaptureError::AcquisitionFailed(message)
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device, CaptureError> {
    if let Ok(index) = device_spec.parse::<usize>() {
        let mut devices: Vec<_> = host
            .input_devices()
            .map_err(|e| CaptureError::AcquisitionFailed(e.to_string()))?
            .collect();

        if index < devices.len() {
            return Ok(devices.swap_remove(index));
        } else {
            return Err(CaptureError::AcquisitionFailed(format!(
                "device index {} is out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            )));
        }
    }

    let devices = host
        .input_devices()
        .map_err(|e| CaptureError::AcquisitionFailed(e.to_string()))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(CaptureError::AcquisitionFailed(format!(
        "audio input device '{device_spec}' not found. Use 'bedtime list-devices' to see available devices."
    )))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T, CaptureError>
where
    F: FnOnce() -> Result<T, CaptureError>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| CaptureError::AcquisitionFailed(format!("failed to open /dev/null: {e}")))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(CaptureError::AcquisitionFailed(
            "failed to duplicate stderr".into(),
        ));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(CaptureError::AcquisitionFailed(
            "failed to redirect stderr".into(),
        ));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
pub(crate) fn suppress_alsa_warnings<F, T>(f: F) -> Result<T, CaptureError>
where
    F: FnOnce() -> Result<T, CaptureError>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_permission_errors() {
        match classify_acquire_error("Operation not permitted: permission denied".into()) {
            CaptureError::PermissionDenied(_) => {}
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
        match classify_acquire_error("device is busy".into()) {
            CaptureError::AcquisitionFailed(_) => {}
            other => panic!("expected AcquisitionFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_mono_downmix() {
        let samples = Arc::new(Mutex::new(Vec::new()));

        CpalCaptureDevice::handle_audio_callback(&[100, 200, -50, 50], &samples, 2);
        assert_eq!(*samples.lock().unwrap(), vec![150, 0]);

        samples.lock().unwrap().clear();
        CpalCaptureDevice::handle_audio_callback(&[30, 30, 30, 90, 90, 90], &samples, 3);
        assert_eq!(*samples.lock().unwrap(), vec![30, 90]);
    }
}
