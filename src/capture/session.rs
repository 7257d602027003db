//! Capture session state machine.
//!
//! One session covers a single start-to-stop recording lifecycle: acquire the
//! microphone, accumulate samples, run a display countdown alongside a
//! one-shot auto-stop deadline, and deliver the finalized artifact as base64
//! through a completion callback.
//!
//! Both the device and the clock are injected so the machine runs in tests
//! without hardware or wall-clock time. Timers are modeled as deadlines
//! driven by [`CaptureSession::poll`] from the host event loop; both are
//! cleared together on every stop path so a stale auto-stop can never fire
//! into a later session.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::artifact::RecordedArtifact;
use super::device::{CaptureDevice, CaptureError};

/// Default recording length when the config does not override it.
pub const DEFAULT_MAX_DURATION_SECS: u32 = 10;

/// Time source for session timers.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time source used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Session status. A session cannot transition to `Recording` while already
/// recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    Recording,
}

/// Events surfaced from [`CaptureSession::poll`] for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The auto-stop deadline fired. `delivered` reports whether an artifact
    /// reached the completion callback.
    AutoStopped { delivered: bool },
    /// A mid-session device fault forced the stop path; the message is for
    /// the user-visible notice.
    DeviceFault(String),
}

/// Completion callback, invoked with the prefix-free base64 artifact.
pub type OnComplete = Box<dyn FnMut(String)>;

/// A single-owner audio capture session.
pub struct CaptureSession<D: CaptureDevice, C: Clock> {
    device: D,
    clock: C,
    status: SessionStatus,
    max_duration_secs: u32,
    remaining_secs: u32,
    /// Next 1-second countdown tick, pending only while recording
    next_tick: Option<Instant>,
    /// One-shot auto-stop deadline, pending only while recording
    auto_stop_at: Option<Instant>,
    on_complete: Option<OnComplete>,
    /// Where to write the local playback preview, if anywhere
    preview_path: Option<PathBuf>,
}

impl<D: CaptureDevice, C: Clock> CaptureSession<D, C> {
    /// Creates an idle session. `max_duration_secs` must be positive; zero
    /// falls back to the default.
    pub fn new(device: D, clock: C, max_duration_secs: u32) -> Self {
        let max_duration_secs = if max_duration_secs == 0 {
            tracing::warn!(
                "max_duration_secs must be positive, using default {}s",
                DEFAULT_MAX_DURATION_SECS
            );
            DEFAULT_MAX_DURATION_SECS
        } else {
            max_duration_secs
        };

        Self {
            device,
            clock,
            status: SessionStatus::Idle,
            max_duration_secs,
            remaining_secs: max_duration_secs,
            next_tick: None,
            auto_stop_at: None,
            on_complete: None,
            preview_path: None,
        }
    }

    /// Sets the completion callback invoked with the base64 artifact.
    pub fn set_on_complete(&mut self, on_complete: OnComplete) {
        self.on_complete = Some(on_complete);
    }

    /// Sets where the playback preview WAV is written on finalize.
    pub fn set_preview_path(&mut self, path: PathBuf) {
        self.preview_path = Some(path);
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_recording(&self) -> bool {
        self.status == SessionStatus::Recording
    }

    /// Seconds left on the display countdown, always in `[0, max_duration]`.
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn max_duration_secs(&self) -> u32 {
        self.max_duration_secs
    }

    /// Starts if idle, stops if recording.
    ///
    /// # Errors
    /// - Propagates start failures; stopping never fails
    pub fn toggle(&mut self) -> Result<(), CaptureError> {
        if self.is_recording() {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Begins a capture session.
    ///
    /// A start while already recording is a logged no-op: the existing
    /// session stays untouched and no second device acquisition is
    /// attempted. On any failure no partial state persists.
    ///
    /// # Errors
    /// - `UnsupportedPlatform` if the platform cannot capture audio
    /// - `PermissionDenied` / `AcquisitionFailed` from the device
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_recording() {
            tracing::info!("Already recording, start ignored");
            return Ok(());
        }

        if !self.device.is_supported() {
            tracing::error!("Audio capture not supported on this platform");
            return Err(CaptureError::UnsupportedPlatform);
        }

        tracing::info!("Requesting microphone access");
        self.device.acquire()?;
        self.device.clear_samples();

        let now = self.clock.now();
        self.status = SessionStatus::Recording;
        self.remaining_secs = self.max_duration_secs;
        self.next_tick = Some(now + Duration::from_secs(1));
        self.auto_stop_at = Some(now + Duration::from_secs(self.max_duration_secs as u64));

        tracing::info!("Recording started ({}s max)", self.max_duration_secs);
        Ok(())
    }

    /// Ends the session. Safe to invoke when already idle.
    ///
    /// Synchronously marks the session idle, cancels both timers, resets the
    /// countdown and releases the device, then finalizes whatever samples
    /// were accumulated. Returns whether an artifact reached the completion
    /// callback.
    pub fn stop(&mut self) -> bool {
        let was_recording = self.is_recording();

        self.status = SessionStatus::Idle;
        self.next_tick = None;
        self.auto_stop_at = None;
        self.remaining_secs = self.max_duration_secs;

        let samples = if was_recording {
            self.device.samples()
        } else {
            Vec::new()
        };
        let sample_rate = self.device.sample_rate();

        if self.device.is_held() {
            self.device.release();
            tracing::info!("Microphone access released");
        }

        if !was_recording {
            return false;
        }
        tracing::info!("Recording stopped");

        self.finalize(&samples, sample_rate)
    }

    /// Builds the artifact and delivers it. Finalize failures are logged
    /// and swallowed; no artifact is delivered and the widget stays usable.
    fn finalize(&mut self, samples: &[i16], sample_rate: u32) -> bool {
        let artifact = match RecordedArtifact::from_samples(samples, sample_rate) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::error!("Finalize failed: {e}");
                return false;
            }
        };

        if let Some(path) = &self.preview_path {
            if let Err(e) = artifact.write_wav(path) {
                tracing::warn!("Failed to write playback preview: {e}");
            }
        }

        let payload = artifact.to_base64();
        if let Some(on_complete) = self.on_complete.as_mut() {
            on_complete(payload);
            true
        } else {
            false
        }
    }

    /// Drives timers and fault detection; call once per host loop iteration.
    ///
    /// The countdown decrements once per whole elapsed second down to a
    /// floor of zero and is purely a display derivative; only the auto-stop
    /// deadline (or a device fault) ends the session.
    pub fn poll(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if !self.is_recording() {
            return events;
        }

        if let Some(fault) = self.device.take_fault() {
            tracing::error!("Device fault during capture: {fault}");
            self.stop();
            events.push(SessionEvent::DeviceFault(fault));
            return events;
        }

        let now = self.clock.now();

        while let Some(tick) = self.next_tick {
            if now < tick {
                break;
            }
            if self.remaining_secs > 0 {
                self.remaining_secs -= 1;
            }
            self.next_tick = Some(tick + Duration::from_secs(1));
        }

        if let Some(deadline) = self.auto_stop_at {
            if now >= deadline {
                tracing::info!("Automatic stop triggered after max duration");
                let delivered = self.stop();
                events.push(SessionEvent::AutoStopped { delivered });
            }
        }

        events
    }

    /// Raw samples accumulated so far, for the live level meter.
    pub fn live_samples(&self) -> Vec<i16> {
        self.device.samples()
    }
}

impl<D: CaptureDevice, C: Clock> Drop for CaptureSession<D, C> {
    /// Teardown releases everything a stop would, even mid-recording, so no
    /// hardware track or timer outlives the session. No artifact is
    /// delivered from teardown.
    fn drop(&mut self) {
        self.next_tick = None;
        self.auto_stop_at = None;
        if self.device.is_held() {
            self.device.release();
            tracing::info!("Microphone access released on teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Manually advanced time source.
    #[derive(Clone)]
    struct FakeClock(Rc<Cell<Instant>>);

    impl FakeClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(Instant::now())))
        }

        fn advance(&self, d: Duration) {
            self.0.set(self.0.get() + d);
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct FakeDeviceState {
        held: bool,
        acquires: usize,
        releases: usize,
        samples: Vec<i16>,
        fault: Option<String>,
        supported: bool,
        fail_acquire: Option<&'static str>,
    }

    /// Scripted capture device, inspected through a shared handle.
    #[derive(Clone)]
    struct FakeDevice(Rc<RefCell<FakeDeviceState>>);

    impl FakeDevice {
        fn new() -> Self {
            Self(Rc::new(RefCell::new(FakeDeviceState {
                supported: true,
                ..Default::default()
            })))
        }

        fn with_samples(samples: Vec<i16>) -> Self {
            let device = Self::new();
            device.0.borrow_mut().samples = samples;
            device
        }
    }

    impl CaptureDevice for FakeDevice {
        fn is_supported(&self) -> bool {
            self.0.borrow().supported
        }

        fn acquire(&mut self) -> Result<(), CaptureError> {
            let mut state = self.0.borrow_mut();
            if let Some(msg) = state.fail_acquire {
                return Err(CaptureError::AcquisitionFailed(msg.into()));
            }
            state.acquires += 1;
            state.held = true;
            Ok(())
        }

        fn release(&mut self) {
            let mut state = self.0.borrow_mut();
            state.held = false;
            state.releases += 1;
        }

        fn is_held(&self) -> bool {
            self.0.borrow().held
        }

        fn take_fault(&mut self) -> Option<String> {
            self.0.borrow_mut().fault.take()
        }

        fn samples(&self) -> Vec<i16> {
            self.0.borrow().samples.clone()
        }

        fn clear_samples(&mut self) {
            // Keep scripted samples so stop has something to finalize
        }

        fn sample_rate(&self) -> u32 {
            16000
        }
    }

    fn session_with(
        device: FakeDevice,
        clock: FakeClock,
        max_secs: u32,
    ) -> (CaptureSession<FakeDevice, FakeClock>, Rc<RefCell<Vec<String>>>) {
        let mut session = CaptureSession::new(device, clock, max_secs);
        let payloads = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&payloads);
        session.set_on_complete(Box::new(move |b64| sink.borrow_mut().push(b64)));
        (session, payloads)
    }

    #[test]
    fn test_countdown_tracks_elapsed_whole_seconds() {
        let clock = FakeClock::new();
        let device = FakeDevice::with_samples(vec![1; 1600]);
        let (mut session, _) = session_with(device, clock.clone(), 10);

        session.start().unwrap();
        assert_eq!(session.remaining_secs(), 10);

        for k in 1..=4u32 {
            clock.advance(Duration::from_secs(1));
            session.poll();
            assert_eq!(session.remaining_secs(), 10 - k);
            assert!(session.is_recording());
        }
    }

    #[test]
    fn test_countdown_floors_at_zero_without_stopping() {
        let clock = FakeClock::new();
        let device = FakeDevice::with_samples(vec![1; 16]);
        let (mut session, _) = session_with(device, clock.clone(), 3);

        session.start().unwrap();
        // Clear the auto-stop deadline to isolate countdown behavior
        session.auto_stop_at = None;

        clock.advance(Duration::from_secs(10));
        session.poll();
        assert_eq!(session.remaining_secs(), 0);
        assert!(session.is_recording());
    }

    #[test]
    fn test_auto_stop_delivers_exactly_one_artifact() {
        let clock = FakeClock::new();
        let device = FakeDevice::with_samples(vec![5; 48000]);
        let (mut session, payloads) = session_with(device.clone(), clock.clone(), 3);

        session.toggle().unwrap();
        clock.advance(Duration::from_millis(3100));
        let events = session.poll();

        assert_eq!(events, vec![SessionEvent::AutoStopped { delivered: true }]);
        assert!(!session.is_recording());
        assert_eq!(payloads.borrow().len(), 1);
        assert_eq!(session.remaining_secs(), 3);
        assert!(!device.0.borrow().held);

        // Further polling after the session ended has no side effects
        clock.advance(Duration::from_secs(5));
        assert!(session.poll().is_empty());
        assert_eq!(payloads.borrow().len(), 1);
    }

    #[test]
    fn test_stop_is_idempotent_when_idle() {
        let clock = FakeClock::new();
        let device = FakeDevice::new();
        let (mut session, payloads) = session_with(device.clone(), clock, 10);

        assert!(!session.stop());
        assert!(!session.stop());
        assert_eq!(session.remaining_secs(), 10);
        assert!(payloads.borrow().is_empty());
        assert_eq!(device.0.borrow().acquires, 0);
    }

    #[test]
    fn test_start_while_recording_is_a_noop() {
        let clock = FakeClock::new();
        let device = FakeDevice::with_samples(vec![1; 160]);
        let (mut session, _) = session_with(device.clone(), clock, 10);

        session.start().unwrap();
        session.start().unwrap();
        assert_eq!(device.0.borrow().acquires, 1);
        assert!(session.is_recording());
    }

    #[test]
    fn test_manual_stop_releases_device_and_delivers() {
        let clock = FakeClock::new();
        let device = FakeDevice::with_samples(vec![2; 320]);
        let (mut session, payloads) = session_with(device.clone(), clock.clone(), 10);

        session.toggle().unwrap();
        clock.advance(Duration::from_secs(2));
        session.poll();
        session.toggle().unwrap();

        assert_eq!(payloads.borrow().len(), 1);
        assert!(!device.0.borrow().held);
        assert_eq!(session.remaining_secs(), 10);

        // The canceled auto-stop deadline must not fire into later idle time
        clock.advance(Duration::from_secs(20));
        assert!(session.poll().is_empty());
        assert_eq!(payloads.borrow().len(), 1);
    }

    #[test]
    fn test_device_fault_forces_stop() {
        let clock = FakeClock::new();
        let device = FakeDevice::with_samples(vec![3; 160]);
        let (mut session, payloads) = session_with(device.clone(), clock, 10);

        session.start().unwrap();
        device.0.borrow_mut().fault = Some("stream died".into());

        let events = session.poll();
        assert_eq!(events, vec![SessionEvent::DeviceFault("stream died".into())]);
        assert!(!session.is_recording());
        assert!(!device.0.borrow().held);
        // Accumulated samples are still finalized, as a manual stop would
        assert_eq!(payloads.borrow().len(), 1);
    }

    #[test]
    fn test_acquisition_failure_leaves_no_partial_state() {
        let clock = FakeClock::new();
        let device = FakeDevice::new();
        device.0.borrow_mut().fail_acquire = Some("device busy");
        let (mut session, payloads) = session_with(device.clone(), clock, 10);

        assert!(session.start().is_err());
        assert!(!session.is_recording());
        assert_eq!(session.remaining_secs(), 10);
        assert!(!device.0.borrow().held);
        assert!(payloads.borrow().is_empty());
    }

    #[test]
    fn test_unsupported_platform_is_terminal_for_the_attempt() {
        let clock = FakeClock::new();
        let device = FakeDevice::new();
        device.0.borrow_mut().supported = false;
        let (mut session, _) = session_with(device.clone(), clock, 10);

        match session.start() {
            Err(CaptureError::UnsupportedPlatform) => {}
            other => panic!("expected UnsupportedPlatform, got {other:?}"),
        }
        assert_eq!(device.0.borrow().acquires, 0);
    }

    #[test]
    fn test_finalize_failure_delivers_nothing() {
        let clock = FakeClock::new();
        // No samples accumulated: finalize hits the Encoding error path
        let device = FakeDevice::new();
        let (mut session, payloads) = session_with(device, clock, 10);

        session.start().unwrap();
        assert!(!session.stop());
        assert!(payloads.borrow().is_empty());
        assert!(!session.is_recording());
    }

    #[test]
    fn test_teardown_mid_recording_releases_everything() {
        let clock = FakeClock::new();
        let device = FakeDevice::with_samples(vec![1; 160]);
        let (mut session, payloads) = session_with(device.clone(), clock, 10);

        session.start().unwrap();
        drop(session);

        let state = device.0.borrow();
        assert!(!state.held);
        assert_eq!(state.releases, 1);
        // Teardown is not a completion
        assert!(payloads.borrow().is_empty());
    }

    #[test]
    fn test_payload_is_prefix_free_base64() {
        let clock = FakeClock::new();
        let device = FakeDevice::with_samples(vec![7; 160]);
        let (mut session, payloads) = session_with(device, clock, 10);

        session.start().unwrap();
        session.stop();

        let payloads = payloads.borrow();
        assert!(!payloads[0].contains(','));
        assert!(!payloads[0].starts_with("data:"));
    }
}
