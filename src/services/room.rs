//! Room state polling and timer control calls

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use super::{
    endpoints,
    http::{ApiRequest, SessionHttpClient},
};
use crate::{
    engine::{AdjustStep, TimerAction, TimerControl},
    error::ApiError,
    state::TheaterState,
};

/// Client for one room's state and timers
pub struct RoomClient {
    http: Arc<SessionHttpClient>,
    room: String,
}

impl RoomClient {
    pub fn new(http: Arc<SessionHttpClient>, room: impl Into<String>) -> Self {
        Self {
            http,
            room: room.into(),
        }
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Fetch the latest authoritative snapshot
    pub async fn room_state(&self) -> Result<TheaterState, ApiError> {
        debug!(room = %self.room, "Fetching room state");
        self.http
            .send_json(ApiRequest::get(endpoints::THEATER_STATE).query("room", self.room.as_str()))
            .await
    }
}

impl TimerControl for RoomClient {
    async fn control_operation_timer(&self, action: TimerAction) -> Result<String, ApiError> {
        self.http
            .send_message(
                ApiRequest::post(endpoints::TIMER_OPERATION)
                    .json(json!({ "action": action, "room": self.room })),
            )
            .await
    }

    async fn control_countdown(
        &self,
        action: TimerAction,
        duration_minutes: Option<u32>,
    ) -> Result<String, ApiError> {
        let mut body = json!({ "action": action, "room": self.room });
        if let Some(minutes) = duration_minutes {
            body["duration_minutes"] = json!(minutes);
        }
        self.http
            .send_message(ApiRequest::post(endpoints::TIMER_COUNTDOWN).json(body))
            .await
    }

    async fn adjust_countdown(&self, step: AdjustStep) -> Result<String, ApiError> {
        self.http
            .send_message(
                ApiRequest::patch(endpoints::TIMER_COUNTDOWN_ADJUST)
                    .json(json!({ "minutes": step, "room": self.room })),
            )
            .await
    }
}
