//! Operation timer: an elapsed-time stopwatch driven by the service's fields

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::{
    control::{BusyFlag, TimerAction, TimerControl},
    seconds_between,
};
use crate::{error::ControlError, state::NoticeBoard};

/// The stopwatch subset of a room snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopwatchFields {
    pub is_running: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub accumulated_seconds: f64,
}

impl StopwatchFields {
    /// Elapsed seconds to display at `now`.
    ///
    /// A `now` earlier than the start time (clock skew) counts as zero elapsed.
    pub fn displayed_at(&self, now: DateTime<Utc>) -> f64 {
        let running_for = match (self.is_running, self.start_time) {
            (true, Some(start)) => seconds_between(start, now).max(0.0),
            _ => 0.0,
        };
        self.accumulated_seconds + running_for
    }

    /// A frozen stopwatch needs a single computation, a running one every frame
    pub fn needs_frames(&self) -> bool {
        self.is_running && self.start_time.is_some()
    }
}

/// Control intents for the operation timer.
///
/// Nothing here touches the displayed value: a successful call is reflected
/// by the next poll.
pub struct StopwatchEngine<C> {
    control: Arc<C>,
    busy: BusyFlag,
    notices: Arc<NoticeBoard>,
}

impl<C: TimerControl> StopwatchEngine<C> {
    pub fn new(control: Arc<C>, notices: Arc<NoticeBoard>) -> Self {
        Self {
            control,
            busy: BusyFlag::new(),
            notices,
        }
    }

    pub async fn start(&self) -> Result<String, ControlError> {
        self.send(TimerAction::Start).await
    }

    pub async fn stop(&self) -> Result<String, ControlError> {
        self.send(TimerAction::Stop).await
    }

    pub async fn reset(&self) -> Result<String, ControlError> {
        self.send(TimerAction::Reset).await
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    async fn send(&self, action: TimerAction) -> Result<String, ControlError> {
        let _busy = self.busy.try_acquire().ok_or(ControlError::Busy)?;

        match self.control.control_operation_timer(action).await {
            Ok(message) => {
                info!("Operation timer {} accepted", action);
                self.notices.success(match action {
                    TimerAction::Start => "Operation timer started.",
                    TimerAction::Stop => "Operation timer stopped.",
                    TimerAction::Reset => "Operation timer has been reset.",
                });
                Ok(message)
            }
            Err(e) => {
                warn!(error = %e, "Operation timer {} failed", action);
                self.notices.error(e.to_string());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::AdjustStep, error::ApiError, state::NoticeLevel};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap()
    }

    #[derive(Default)]
    struct FakeControl {
        calls: Mutex<Vec<TimerAction>>,
        fail_with: Option<ApiError>,
        gate: Option<Arc<Notify>>,
    }

    impl TimerControl for FakeControl {
        async fn control_operation_timer(&self, action: TimerAction) -> Result<String, ApiError> {
            self.calls.lock().unwrap().push(action);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(format!("Timer {action}")),
            }
        }

        async fn control_countdown(
            &self,
            _action: TimerAction,
            _duration_minutes: Option<u32>,
        ) -> Result<String, ApiError> {
            unreachable!("stopwatch never drives the countdown")
        }

        async fn adjust_countdown(&self, _step: AdjustStep) -> Result<String, ApiError> {
            unreachable!("stopwatch never drives the countdown")
        }
    }

    #[test]
    fn running_scenario_from_accumulated_base() {
        let fields = StopwatchFields {
            is_running: true,
            start_time: Some(t0()),
            accumulated_seconds: 120.0,
        };
        let shown = fields.displayed_at(t0() + Duration::seconds(30));
        assert_eq!(shown, 150.0);
        assert_eq!(crate::utils::format_duration(shown), "00:02:30");
        assert_eq!(fields.displayed_at(t0()), 120.0);
    }

    #[test]
    fn running_without_start_time_degrades_to_accumulated() {
        let fields = StopwatchFields {
            is_running: true,
            start_time: None,
            accumulated_seconds: 42.0,
        };
        assert_eq!(fields.displayed_at(t0()), 42.0);
        assert!(!fields.needs_frames());
    }

    #[test]
    fn clock_behind_start_time_never_shows_less_than_accumulated() {
        let fields = StopwatchFields {
            is_running: true,
            start_time: Some(t0()),
            accumulated_seconds: 10.0,
        };
        assert_eq!(fields.displayed_at(t0() - Duration::seconds(5)), 10.0);
    }

    proptest! {
        #[test]
        fn stopped_display_ignores_now(acc in 0.0f64..1e7, offset in -1_000_000i64..1_000_000) {
            let fields = StopwatchFields {
                is_running: false,
                start_time: Some(t0()),
                accumulated_seconds: acc,
            };
            prop_assert_eq!(fields.displayed_at(t0() + Duration::seconds(offset)), acc);
        }

        #[test]
        fn running_display_is_non_decreasing(acc in 0.0f64..1e6, a in 0i64..100_000_000, b in 0i64..100_000_000) {
            let fields = StopwatchFields {
                is_running: true,
                start_time: Some(t0()),
                accumulated_seconds: acc,
            };
            let (early, late) = if a <= b { (a, b) } else { (b, a) };
            let first = fields.displayed_at(t0() + Duration::milliseconds(early));
            let second = fields.displayed_at(t0() + Duration::milliseconds(late));
            prop_assert!(second >= first);
        }
    }

    #[tokio::test]
    async fn successful_intent_posts_notice_and_forwards_action() {
        let control = Arc::new(FakeControl::default());
        let notices = Arc::new(NoticeBoard::new());
        let engine = StopwatchEngine::new(Arc::clone(&control), Arc::clone(&notices));

        engine.start().await.unwrap();
        engine.reset().await.unwrap();

        assert_eq!(*control.calls.lock().unwrap(), vec![TimerAction::Start, TimerAction::Reset]);
        assert_eq!(notices.recent().last().unwrap().level, NoticeLevel::Success);
        assert!(!engine.is_busy());
    }

    #[tokio::test]
    async fn failed_intent_surfaces_message_verbatim() {
        let control = Arc::new(FakeControl {
            fail_with: Some(ApiError::Rejected {
                status: 400,
                message: "Timer is not running".into(),
            }),
            ..Default::default()
        });
        let notices = Arc::new(NoticeBoard::new());
        let engine = StopwatchEngine::new(control, Arc::clone(&notices));

        let err = engine.stop().await.unwrap_err();
        assert_eq!(err.to_string(), "Timer is not running");
        let notice = notices.recent().pop().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Timer is not running");
        assert!(!engine.is_busy());
    }

    #[tokio::test]
    async fn second_intent_while_outstanding_is_refused() {
        let gate = Arc::new(Notify::new());
        let control = Arc::new(FakeControl {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let engine = Arc::new(StopwatchEngine::new(
            Arc::clone(&control),
            Arc::new(NoticeBoard::new()),
        ));

        let first = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.start().await }
        });
        while !engine.is_busy() {
            tokio::task::yield_now().await;
        }

        assert_eq!(engine.stop().await, Err(ControlError::Busy));

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(control.calls.lock().unwrap().len(), 1);
    }
}
