//! Utility functions module
//!
//! Clock sources, display formatting and signal handling.

pub mod clock;
pub mod format;
pub mod signals;

// Re-export main items
pub use clock::{Clock, ManualClock, SystemClock};
pub use format::{format_duration, ClockDisplay};
pub use signals::shutdown_signal;
