//! Room state polling background task

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::state::{AppState, View};

/// Failures in a row before logging escalates to error
const FAILURE_ESCALATION: u32 = 5;

/// Poll the room state on a fixed interval and publish each snapshot whole.
///
/// A failed poll leaves the previous snapshot in place. Polling pauses while
/// the dashboard sits at the login view, and the room view is emptied.
pub async fn room_poll_task(state: Arc<AppState>) {
    info!(
        room = %state.room_id,
        "Starting room poll task every {}ms",
        state.poll_interval.as_millis()
    );

    let mut ticker = interval(state.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut consecutive_failures: u32 = 0;

    loop {
        ticker.tick().await;

        if state.view.current() == View::Login {
            debug!("At login view, skipping poll");
            if state.latest_snapshot().is_some() {
                state.publish_snapshot(None);
            }
            continue;
        }

        match state.room.room_state().await {
            Ok(snapshot) => {
                if consecutive_failures > 0 {
                    info!("Room state reachable again after {} failures", consecutive_failures);
                }
                consecutive_failures = 0;
                state.publish_snapshot(Some(snapshot));
            }
            Err(e) => {
                consecutive_failures = consecutive_failures.saturating_add(1);

                if consecutive_failures == 1 {
                    state
                        .notices
                        .error("Failed to load room data. Please check your connection.");
                }

                if consecutive_failures >= FAILURE_ESCALATION {
                    error!(
                        error = %e,
                        consecutive_failures,
                        "Room poll failed repeatedly, keeping last snapshot"
                    );
                } else {
                    warn!(error = %e, "Room poll failed, keeping last snapshot");
                }
            }
        }
    }
}
