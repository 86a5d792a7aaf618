//! Live timer reconciliation
//!
//! The remote service owns every timer field. This module only interpolates
//! the latest snapshot against the wall clock on each display frame and
//! forwards control intents back to the service.

pub mod control;
pub mod countdown;
pub mod reconciler;
pub mod render_loop;
pub mod stopwatch;

use chrono::{DateTime, Utc};

pub use control::{AdjustStep, Affordance, BusyFlag, ControlAffordances, TimerAction, TimerControl};
pub use countdown::{CompletionFlag, CountdownEngine, CountdownFields};
pub use reconciler::{compute_frame, Reconciler, TimerFrame};
pub use render_loop::{FrameTicker, RenderLoop};
pub use stopwatch::{StopwatchEngine, StopwatchFields};

/// Signed seconds from `from` to `to`, with sub-second precision
pub(crate) fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}
