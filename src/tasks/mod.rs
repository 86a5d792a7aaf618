//! Background tasks module
//!
//! Tasks that run alongside the local dashboard server.

pub mod reconcile;
pub mod room_poller;

// Re-export main functions
pub use reconcile::reconcile_task;
pub use room_poller::room_poll_task;
