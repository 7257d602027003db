//! Terminal user interface screens for bedtime.

pub mod draw;
pub mod error;
pub mod record;

pub use draw::{DrawCommand, DrawTui};
pub use error::{show_notice, ErrorScreen};
pub use record::{RecordCommand, RecordTui};
