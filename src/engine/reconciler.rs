//! One render loop per snapshot, feeding both timers

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use super::{countdown::CompletionFlag, render_loop::RenderLoop};
use crate::{
    state::{NoticeBoard, TheaterState},
    utils::Clock,
};

/// Both timers as displayed on one frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TimerFrame {
    pub stopwatch_seconds: f64,
    pub stopwatch_running: bool,
    pub countdown_remaining: f64,
    pub countdown_running: bool,
    pub progress_pct: f64,
    pub complete: bool,
    pub computed_at: Option<DateTime<Utc>>,
}

impl TimerFrame {
    /// Whether another frame could show something different
    pub fn is_live(&self) -> bool {
        self.stopwatch_running || (self.countdown_running && self.countdown_remaining > 0.0)
    }
}

/// Derive both timers from `snapshot` at `now`. `complete` is left to the caller.
pub fn compute_frame(snapshot: &TheaterState, now: DateTime<Utc>) -> TimerFrame {
    let stopwatch = snapshot.stopwatch();
    let countdown = snapshot.countdown();
    let remaining = countdown.remaining_at(now);

    TimerFrame {
        stopwatch_seconds: stopwatch.displayed_at(now),
        stopwatch_running: stopwatch.needs_frames(),
        countdown_remaining: remaining,
        countdown_running: countdown.is_running && countdown.target_time.is_some(),
        progress_pct: countdown.progress_pct(remaining),
        complete: false,
        computed_at: Some(now),
    }
}

/// Restarts the render loop whenever a new snapshot arrives.
///
/// Dropping the reconciler cancels its loop.
pub struct Reconciler {
    clock: Arc<dyn Clock>,
    frame_interval: Duration,
    completion: Arc<Mutex<CompletionFlag>>,
    frames: Arc<watch::Sender<TimerFrame>>,
    notices: Arc<NoticeBoard>,
    render: RenderLoop,
}

impl Reconciler {
    pub fn new(
        clock: Arc<dyn Clock>,
        frame_interval: Duration,
        completion: Arc<Mutex<CompletionFlag>>,
        frames: Arc<watch::Sender<TimerFrame>>,
        notices: Arc<NoticeBoard>,
    ) -> Self {
        Self {
            clock,
            frame_interval,
            completion,
            frames,
            notices,
            render: RenderLoop::idle(),
        }
    }

    /// Replace the authoritative reference; the previous loop is cancelled first
    pub fn apply(&mut self, snapshot: Option<TheaterState>) {
        self.render.cancel();

        let Some(snapshot) = snapshot else {
            debug!("No snapshot yet, showing idle timers");
            if let Ok(mut flag) = self.completion.lock() {
                flag.clear();
            }
            self.frames.send_replace(TimerFrame::default());
            self.render = RenderLoop::idle();
            return;
        };

        let countdown = snapshot.countdown();
        let room = snapshot.room_name.clone();
        let completion = Arc::clone(&self.completion);
        let frames = Arc::clone(&self.frames);
        let notices = Arc::clone(&self.notices);

        let publish = move |mut frame: TimerFrame| {
            if let Ok(mut flag) = completion.lock() {
                if flag.observe(&countdown, frame.countdown_remaining) {
                    info!(room = %room, "Countdown complete");
                    notices.success(format!("Countdown complete! Timer for {room} has finished."));
                }
                frame.complete = flag.is_raised();
            }
            frames.send_replace(frame);
        };

        self.render = RenderLoop::start(
            Some(snapshot),
            Arc::clone(&self.clock),
            self.frame_interval,
            compute_frame,
            TimerFrame::is_live,
            publish,
        );
    }

    /// Whether frames are still being produced for the current snapshot
    pub fn is_rendering(&self) -> bool {
        self.render.is_active()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerFrame> {
        self.frames.subscribe()
    }

    pub fn shutdown(&mut self) {
        self.render.cancel();
    }
}
