//! Audio capture feature for bedtime.
//!
//! Provides the capture-device abstraction, the session state machine with
//! countdown and auto-stop, and the finalized base64 artifact.

pub mod artifact;
pub mod device;
pub mod session;

pub use artifact::RecordedArtifact;
pub use device::{CaptureDevice, CaptureError, CpalCaptureDevice};
pub use session::{CaptureSession, Clock, SessionEvent, SessionStatus, SystemClock};
