//! Control intents: the seam between the engines and the remote service

use std::{
    fmt,
    future::Future,
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
};

use serde::{Serialize, Serializer};

use crate::{error::ApiError, state::TheaterState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    Start,
    Stop,
    Reset,
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerAction::Start => write!(f, "start"),
            TimerAction::Stop => write!(f, "stop"),
            TimerAction::Reset => write!(f, "reset"),
        }
    }
}

impl FromStr for TimerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(TimerAction::Start),
            "stop" => Ok(TimerAction::Stop),
            "reset" => Ok(TimerAction::Reset),
            other => Err(format!("Unknown timer action: {other}")),
        }
    }
}

/// Shift of the countdown target by one minute either way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustStep {
    AddMinute,
    SubtractMinute,
}

impl AdjustStep {
    pub fn minutes(self) -> i8 {
        match self {
            AdjustStep::AddMinute => 1,
            AdjustStep::SubtractMinute => -1,
        }
    }
}

impl TryFrom<i64> for AdjustStep {
    type Error = String;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        match minutes {
            1 => Ok(AdjustStep::AddMinute),
            -1 => Ok(AdjustStep::SubtractMinute),
            other => Err(format!("Countdown can only be adjusted by 1 or -1 minutes, got {other}")),
        }
    }
}

impl Serialize for AdjustStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.minutes())
    }
}

/// Remote calls behind the timer controls. Each resolves to the service's message.
pub trait TimerControl: Send + Sync + 'static {
    fn control_operation_timer(
        &self,
        action: TimerAction,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    fn control_countdown(
        &self,
        action: TimerAction,
        duration_minutes: Option<u32>,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;

    fn adjust_countdown(
        &self,
        step: AdjustStep,
    ) -> impl Future<Output = Result<String, ApiError>> + Send;
}

/// Set while one of an engine's control calls is outstanding
#[derive(Debug, Default)]
pub struct BusyFlag(AtomicBool);

impl BusyFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Claim the flag; `None` when a call is already in flight
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.0))
    }

    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the busy flag on every exit path
#[derive(Debug)]
pub struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// How a single control is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Affordance {
    Hidden,
    Disabled,
    Enabled,
}

impl Affordance {
    fn offered(offered: bool, busy: bool) -> Self {
        match (offered, busy) {
            (false, _) => Affordance::Hidden,
            (true, true) => Affordance::Disabled,
            (true, false) => Affordance::Enabled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StopwatchControls {
    pub start: Affordance,
    pub stop: Affordance,
    pub reset: Affordance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownControls {
    pub start: Affordance,
    pub stop: Affordance,
    pub reset: Affordance,
    pub adjust: Affordance,
}

/// Which controls the dashboard offers for the current snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlAffordances {
    pub stopwatch: StopwatchControls,
    pub countdown: CountdownControls,
}

impl ControlAffordances {
    pub fn for_snapshot(
        snapshot: Option<&TheaterState>,
        is_admin: bool,
        stopwatch_busy: bool,
        countdown_busy: bool,
    ) -> Self {
        let available = is_admin && snapshot.is_some();
        let op_running = snapshot.is_some_and(|s| s.op_is_running);
        let cd_running = snapshot.is_some_and(|s| s.cd_is_running);

        let sw = |offered: bool| Affordance::offered(available && offered, stopwatch_busy);
        let cd = |offered: bool| Affordance::offered(available && offered, countdown_busy);

        Self {
            stopwatch: StopwatchControls {
                start: sw(!op_running),
                stop: sw(op_running),
                reset: sw(true),
            },
            countdown: CountdownControls {
                start: cd(!cd_running),
                stop: cd(cd_running),
                reset: cd(true),
                adjust: cd(cd_running),
            },
        }
    }
}
