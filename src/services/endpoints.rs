//! Paths of the remote monitoring service, relative to its base URL

pub const AUTH_LOGIN: &str = "auth/login";
pub const AUTH_LOGOUT: &str = "auth/logout";
pub const AUTH_REFRESH: &str = "auth/refresh";

pub const THEATER_STATE: &str = "theater/state";
pub const TIMER_OPERATION: &str = "theater/timer/op";
pub const TIMER_COUNTDOWN: &str = "theater/timer/cd";
pub const TIMER_COUNTDOWN_ADJUST: &str = "theater/timer/cd/adjust";
