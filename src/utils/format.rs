//! Display formatting for durations and the wall clock

use std::fmt;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

/// Format a number of seconds as `HH:MM:SS`, flooring each component
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Formatted wall-clock strings shown in the dashboard header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockDisplay {
    pub time: String,
    pub date: String,
}

impl ClockDisplay {
    pub fn render<Tz>(at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        Self {
            time: at.format("%H:%M:%S").to_string(),
            date: at.format("%A, %-d %B %Y").to_string(),
        }
    }
}
