//! Theater Dashboard - a live operating-theater timer dashboard agent
//!
//! This is the main entry point for the theater-dashboard application.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use theater_dashboard::{
    api::create_router,
    config::Config,
    state::{AppState, SessionStore},
    tasks::{reconcile_task, room_poll_task},
    utils::{shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("theater_dashboard={},tower_http=info", config.log_level()))
        .init();

    info!("Starting theater-dashboard v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: api={}, room={}, poll={}ms, frame={}ms",
        config.api_url, config.room, config.poll_interval_ms, config.frame_interval_ms
    );

    // Restore the persisted session, if any
    let session = match config.session_path() {
        Some(path) => Arc::new(SessionStore::hydrate(path)),
        None => {
            warn!("No data directory available, session will not persist");
            Arc::new(SessionStore::in_memory())
        }
    };

    let state = Arc::new(AppState::new(&config, session, Arc::new(SystemClock))?);

    // Background tasks: polling feeds snapshots, reconciliation renders them
    let poll_handle = tokio::spawn(room_poll_task(Arc::clone(&state)));
    let reconcile_handle = tokio::spawn(reconcile_task(Arc::clone(&state)));

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Dashboard running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET   /status           - Rendered timers, session and notices");
    info!("  GET   /health           - Health check");
    info!("  POST  /login            - Log in with username and password");
    info!("  POST  /logout           - Log out");
    info!("  POST  /refresh          - Renew the access token");
    info!("  POST  /timer/op/:action - start | stop | reset the operation timer");
    info!("  POST  /timer/cd/start   - Start the countdown (duration_minutes)");
    info!("  POST  /timer/cd/:action - stop | reset the countdown");
    info!("  PATCH /timer/cd/adjust  - Shift the countdown by 1 or -1 minutes");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    // Dropping the reconciliation task cancels its render loop
    poll_handle.abort();
    reconcile_handle.abort();

    info!("Dashboard shutdown complete");
    Ok(())
}
