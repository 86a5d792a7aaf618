//! HTTP API module
//!
//! The local dashboard surface: rendered status plus the login and timer
//! control endpoints.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/refresh", post(refresh_handler))
        .route("/timer/op/:action", post(operation_timer_handler))
        .route("/timer/cd/start", post(countdown_start_handler))
        .route("/timer/cd/adjust", patch(countdown_adjust_handler))
        .route("/timer/cd/:action", post(countdown_action_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
