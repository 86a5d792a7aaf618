//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    engine::{ControlAffordances, TimerFrame},
    state::{Notice, SensorReadings, View},
    utils::{format_duration, ClockDisplay},
};

/// API response structure for action endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, code: Option<&'static str>) -> Self {
        Self {
            status: status.to_string(),
            message,
            code,
            timestamp: Utc::now(),
        }
    }

    pub fn ok(message: String) -> Self {
        Self::new("ok", message, None)
    }

    pub fn error(message: String, code: &'static str) -> Self {
        Self::new("error", message, Some(code))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountdownStartRequest {
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustRequest {
    pub minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub authenticated: bool,
    pub admin: bool,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopwatchStatus {
    pub display: String,
    pub seconds: f64,
    pub running: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountdownStatus {
    pub display: String,
    pub remaining_seconds: f64,
    pub running: bool,
    pub complete: bool,
    pub progress_pct: f64,
    pub label: &'static str,
}

impl StopwatchStatus {
    pub fn from_frame(frame: &TimerFrame) -> Self {
        Self {
            display: format_duration(frame.stopwatch_seconds),
            seconds: frame.stopwatch_seconds,
            running: frame.stopwatch_running,
        }
    }
}

impl CountdownStatus {
    /// `complete` comes from the engine so a reset shows up before the next frame
    pub fn from_frame(frame: &TimerFrame, complete: bool) -> Self {
        let label = match (frame.countdown_running, complete) {
            (false, _) => "Not Started",
            (true, true) => "Time Complete",
            (true, false) => "Counting Down",
        };
        Self {
            display: format_duration(frame.countdown_remaining),
            remaining_seconds: frame.countdown_remaining,
            running: frame.countdown_running,
            complete,
            progress_pct: frame.progress_pct,
            label,
        }
    }
}

/// Full dashboard view
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub room: String,
    pub view: View,
    pub session: SessionSummary,
    pub snapshot_received: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub stopwatch: StopwatchStatus,
    pub countdown: CountdownStatus,
    pub controls: ControlAffordances,
    pub sensors: Option<SensorReadings>,
    pub clock: ClockDisplay,
    pub notices: Vec<Notice>,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
    pub uptime: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_labels_follow_run_state() {
        let mut frame = TimerFrame::default();
        assert_eq!(CountdownStatus::from_frame(&frame, false).label, "Not Started");

        frame.countdown_running = true;
        frame.countdown_remaining = 61.0;
        let status = CountdownStatus::from_frame(&frame, false);
        assert_eq!(status.label, "Counting Down");
        assert_eq!(status.display, "00:01:01");

        frame.countdown_remaining = 0.0;
        assert_eq!(CountdownStatus::from_frame(&frame, true).label, "Time Complete");
    }

    #[test]
    fn error_response_carries_code() {
        let body = serde_json::to_value(ApiResponse::error("nope".into(), "control.busy")).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], "control.busy");
        let ok = serde_json::to_value(ApiResponse::ok("fine".into())).unwrap();
        assert!(ok.get("code").is_none());
    }
}
