//! Snapshot reconciliation background task

use std::sync::Arc;

use tracing::{debug, info};

use crate::{engine::Reconciler, state::AppState};

/// Feed every new snapshot into a single reconciler driving both timers.
///
/// Ends when the snapshot channel closes; the render loop is cancelled with it.
pub async fn reconcile_task(state: Arc<AppState>) {
    info!("Starting timer reconciliation task");

    let mut reconciler = Reconciler::new(
        Arc::clone(&state.clock),
        state.frame_interval,
        state.countdown.completion(),
        Arc::clone(&state.frame_tx),
        Arc::clone(&state.notices),
    );
    let mut snapshots = state.snapshot_tx.subscribe();

    loop {
        let snapshot = snapshots.borrow_and_update().clone();
        debug!(has_snapshot = snapshot.is_some(), "Reconciling timers");
        reconciler.apply(snapshot);

        if snapshots.changed().await.is_err() {
            break;
        }
    }

    reconciler.shutdown();
    info!("Timer reconciliation stopped");
}
