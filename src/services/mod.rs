//! Remote monitoring service access
//!
//! The session-aware HTTP layer plus the auth and room clients built on it.

pub mod auth;
pub mod endpoints;
pub mod envelope;
pub mod http;
pub mod room;

// Re-export main types
pub use auth::AuthService;
pub use http::{ApiRequest, AuthPayload, HttpConfig, SessionHttpClient};
pub use room::RoomClient;
