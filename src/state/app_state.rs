//! Main application state shared by the tasks and the local API

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use super::{NoticeBoard, SessionStore, TheaterState, View, ViewRouter};
use crate::{
    config::Config,
    engine::{ControlAffordances, CountdownEngine, StopwatchEngine, TimerFrame},
    error::ApiError,
    services::{AuthService, HttpConfig, RoomClient, SessionHttpClient},
    utils::Clock,
};

/// Everything the dashboard agent needs, wired once at startup
pub struct AppState {
    pub room_id: String,
    pub poll_interval: Duration,
    pub frame_interval: Duration,
    pub clock: Arc<dyn Clock>,
    /// Session context shared with the HTTP layer
    pub session: Arc<SessionStore>,
    pub view: Arc<ViewRouter>,
    pub notices: Arc<NoticeBoard>,
    pub auth: AuthService,
    pub room: Arc<RoomClient>,
    pub stopwatch: StopwatchEngine<RoomClient>,
    pub countdown: CountdownEngine<RoomClient>,
    /// Latest authoritative snapshot, replaced wholesale by each poll
    pub snapshot_tx: watch::Sender<Option<TheaterState>>,
    /// Latest rendered timers
    pub frame_tx: Arc<watch::Sender<TimerFrame>>,
    /// Server metadata
    pub start_time: Instant,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    /// Wire the clients and engines around an already hydrated session
    pub fn new(
        config: &Config,
        session: Arc<SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ApiError> {
        let initial_view = if session.is_authenticated() { View::Room } else { View::Login };
        let view = Arc::new(ViewRouter::new(initial_view));
        let notices = Arc::new(NoticeBoard::new());

        let http = Arc::new(SessionHttpClient::new(
            HttpConfig {
                base_url: config.api_url.clone(),
                request_timeout: config.request_timeout(),
                refresh_timeout: config.refresh_timeout(),
            },
            Arc::clone(&session),
            view.clone(),
        )?);

        let room = Arc::new(RoomClient::new(Arc::clone(&http), config.room.clone()));
        let (snapshot_tx, _) = watch::channel(None);
        let (frame_tx, _) = watch::channel(TimerFrame::default());

        Ok(Self {
            room_id: config.room.clone(),
            poll_interval: config.poll_interval(),
            frame_interval: config.frame_interval(),
            clock,
            session,
            view: Arc::clone(&view),
            notices: Arc::clone(&notices),
            auth: AuthService::new(http, view),
            stopwatch: StopwatchEngine::new(Arc::clone(&room), Arc::clone(&notices)),
            countdown: CountdownEngine::new(Arc::clone(&room), notices),
            room,
            snapshot_tx,
            frame_tx: Arc::new(frame_tx),
            start_time: Instant::now(),
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        })
    }

    /// Remember the last control action for the status view
    pub fn record_action(&self, action: &str) {
        debug!("Recording action: {}", action);
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    /// Calculate agent uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    pub fn latest_snapshot(&self) -> Option<TheaterState> {
        self.snapshot_tx.borrow().clone()
    }

    /// Replace the snapshot with a fresh poll result
    pub fn publish_snapshot(&self, snapshot: Option<TheaterState>) {
        self.snapshot_tx.send_replace(snapshot);
    }

    pub fn current_frame(&self) -> TimerFrame {
        *self.frame_tx.borrow()
    }

    pub fn affordances(&self) -> ControlAffordances {
        ControlAffordances::for_snapshot(
            self.snapshot_tx.borrow().as_ref(),
            self.session.is_admin(),
            self.stopwatch.is_busy(),
            self.countdown.is_busy(),
        )
    }
}
