//! State management module
//!
//! The session context, the latest room snapshot, the current view and the
//! notice board, tied together by [`AppState`].

pub mod app_state;
pub mod notices;
pub mod session;
pub mod snapshot;
pub mod view;

// Re-export main types
pub use app_state::AppState;
pub use notices::{Notice, NoticeBoard, NoticeLevel};
pub use session::{Role, Session, SessionStore, User};
pub use snapshot::{SensorReadings, TheaterState};
pub use view::{LoginBoundary, View, ViewRouter};
