//! Countdown timer: remaining time, progress and the one-shot completion flag

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{
    control::{AdjustStep, BusyFlag, TimerAction, TimerControl},
    seconds_between,
};
use crate::{error::ControlError, state::NoticeBoard};

/// The countdown subset of a room snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountdownFields {
    pub is_running: bool,
    pub target_time: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
}

impl CountdownFields {
    /// Seconds left at `now`; zero when stopped or when the target is missing
    pub fn remaining_at(&self, now: DateTime<Utc>) -> f64 {
        match (self.is_running, self.target_time) {
            (true, Some(target)) => seconds_between(now, target).max(0.0),
            _ => 0.0,
        }
    }

    /// Percentage of the run already elapsed, within `[0, 100]`
    pub fn progress_pct(&self, remaining: f64) -> f64 {
        if !self.is_running || self.duration_seconds <= 0.0 {
            return 0.0;
        }
        let elapsed = self.duration_seconds - remaining;
        (elapsed / self.duration_seconds * 100.0).clamp(0.0, 100.0)
    }

    pub fn needs_frames(&self, remaining: f64) -> bool {
        self.is_running && self.target_time.is_some() && remaining > 0.0
    }
}

/// Raised once when a run reaches zero.
///
/// A run is identified by its target time, so a countdown sitting at zero
/// never re-raises, while an adjusted or restarted run can complete again.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CompletionFlag {
    raised: bool,
    fired_for: Option<DateTime<Utc>>,
}

impl CompletionFlag {
    /// Feed one computed frame; returns true only on the frame the flag goes up
    pub fn observe(&mut self, fields: &CountdownFields, remaining: f64) -> bool {
        if !fields.is_running || fields.target_time.is_none() {
            self.clear();
            return false;
        }

        if remaining <= 0.0 {
            if self.fired_for == fields.target_time {
                return false;
            }
            self.raised = true;
            self.fired_for = fields.target_time;
            return true;
        }

        if self.raised && self.fired_for != fields.target_time {
            debug!("Countdown target moved, lowering completion flag");
            self.raised = false;
        }
        false
    }

    /// Forget the run entirely; only once the service reports it stopped
    pub fn clear(&mut self) {
        self.raised = false;
        self.fired_for = None;
    }

    /// Lower the flag after a reset but remember the finished run, so a poll
    /// taken before the reset landed cannot raise it a second time
    pub fn acknowledge_reset(&mut self) {
        self.raised = false;
    }

    pub fn is_raised(&self) -> bool {
        self.raised
    }
}

/// Control intents for the countdown timer
pub struct CountdownEngine<C> {
    control: Arc<C>,
    busy: BusyFlag,
    completion: Arc<Mutex<CompletionFlag>>,
    notices: Arc<NoticeBoard>,
}

impl<C: TimerControl> CountdownEngine<C> {
    pub fn new(control: Arc<C>, notices: Arc<NoticeBoard>) -> Self {
        Self {
            control,
            busy: BusyFlag::new(),
            completion: Arc::new(Mutex::new(CompletionFlag::default())),
            notices,
        }
    }

    /// Shared with the reconciler, which raises it
    pub fn completion(&self) -> Arc<Mutex<CompletionFlag>> {
        Arc::clone(&self.completion)
    }

    pub fn is_complete(&self) -> bool {
        self.completion.lock().map(|flag| flag.is_raised()).unwrap_or(false)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Start a run of `duration_minutes` (at least 1)
    pub async fn start(&self, duration_minutes: u32) -> Result<String, ControlError> {
        if duration_minutes < 1 {
            return Err(ControlError::InvalidDuration(duration_minutes));
        }
        let _busy = self.busy.try_acquire().ok_or(ControlError::Busy)?;

        let result = self
            .control
            .control_countdown(TimerAction::Start, Some(duration_minutes))
            .await;
        self.report(result, "start", format!("Timer started for {duration_minutes} minutes."))
    }

    /// Pause the run; whether it can be resumed is up to the service
    pub async fn stop(&self) -> Result<String, ControlError> {
        let _busy = self.busy.try_acquire().ok_or(ControlError::Busy)?;

        let result = self.control.control_countdown(TimerAction::Stop, None).await;
        self.report(result, "stop", "Timer has been paused.".to_string())
    }

    /// Reset the run and drop the completion badge right away
    pub async fn reset(&self) -> Result<String, ControlError> {
        let _busy = self.busy.try_acquire().ok_or(ControlError::Busy)?;

        let result = self.control.control_countdown(TimerAction::Reset, None).await;
        if result.is_ok() {
            if let Ok(mut flag) = self.completion.lock() {
                flag.acknowledge_reset();
            }
        }
        self.report(result, "reset", "Timer has been reset.".to_string())
    }

    /// Shift the target by one minute; the service decides the lower bound
    pub async fn adjust(&self, step: AdjustStep) -> Result<String, ControlError> {
        let _busy = self.busy.try_acquire().ok_or(ControlError::Busy)?;

        let result = self.control.adjust_countdown(step).await;
        let notice = match step {
            AdjustStep::AddMinute => "Added 1 minute.",
            AdjustStep::SubtractMinute => "Subtracted 1 minute.",
        };
        self.report(result, "adjust", notice.to_string())
    }

    fn report(
        &self,
        result: Result<String, crate::error::ApiError>,
        action: &str,
        success_notice: String,
    ) -> Result<String, ControlError> {
        match result {
            Ok(message) => {
                info!("Countdown {} accepted", action);
                self.notices.success(success_notice);
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "Countdown {} failed", action);
                self.notices.error(e.to_string());
                Err(e.into())
            }
        }
    }
}
