//! Authoritative room state as returned by the monitoring service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{CountdownFields, StopwatchFields};

/// One poll result for a room. Each snapshot fully supersedes the previous one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TheaterState {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub room_name: String,

    // Operation timer (stopwatch)
    #[serde(default)]
    pub op_is_running: bool,
    #[serde(default)]
    pub op_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub op_accumulated_seconds: f64,

    // Countdown timer
    #[serde(default)]
    pub cd_is_running: bool,
    #[serde(default)]
    pub cd_target_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cd_duration_seconds: f64,

    /// Sensor readings, passed through untouched
    #[serde(flatten)]
    pub sensors: SensorReadings,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    #[serde(default)]
    pub ach_theoretical: f64,
    #[serde(default)]
    pub ach_empirical: f64,
    #[serde(default)]
    pub current_temp: f64,
    #[serde(default)]
    pub current_pressure: f64,
    #[serde(default)]
    pub current_humidity: Option<f64>,
    #[serde(default)]
    pub current_logic_ahu: bool,
    #[serde(default)]
    pub ahu_cycle_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub oxygen: Option<f64>,
    #[serde(default)]
    pub nitrous: Option<f64>,
    #[serde(default)]
    pub air: Option<f64>,
    #[serde(default)]
    pub vacuum: Option<f64>,
    #[serde(default)]
    pub instrument: Option<f64>,
    #[serde(default)]
    pub carbon: Option<f64>,
}

impl TheaterState {
    pub fn stopwatch(&self) -> StopwatchFields {
        StopwatchFields {
            is_running: self.op_is_running,
            start_time: self.op_start_time,
            accumulated_seconds: self.op_accumulated_seconds.max(0.0),
        }
    }

    pub fn countdown(&self) -> CountdownFields {
        CountdownFields {
            is_running: self.cd_is_running,
            target_time: self.cd_target_time,
            duration_seconds: self.cd_duration_seconds.max(0.0),
        }
    }
}
