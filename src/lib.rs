//! Theater Dashboard - a live operating-theater timer dashboard agent
//!
//! Polls a remote monitoring service for a room's timer and sensor state,
//! renders the operation stopwatch and the countdown smoothly between polls,
//! and keeps the authenticated session alive across expired tokens.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{ApiError, ControlError};
pub use state::AppState;
pub use utils::signals::shutdown_signal;
