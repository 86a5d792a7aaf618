//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Local;
use tracing::{info, warn};

use super::responses::{
    AdjustRequest, ApiResponse, CountdownStartRequest, CountdownStatus, HealthResponse,
    LoginRequest, SessionSummary, StatusResponse, StopwatchStatus,
};
use crate::{
    engine::{AdjustStep, TimerAction},
    error::{ApiError, ControlError},
    state::AppState,
    utils::ClockDisplay,
};

type HandlerResult = Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)>;

fn reject(status: StatusCode, message: String, code: &'static str) -> (StatusCode, Json<ApiResponse>) {
    (status, Json(ApiResponse::error(message, code)))
}

fn api_status(err: &ApiError) -> StatusCode {
    match err {
        ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        ApiError::Rejected { status, .. } if (400..500).contains(status) => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_REQUEST)
        }
        ApiError::Application { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn control_failure(err: ControlError) -> (StatusCode, Json<ApiResponse>) {
    let status = match &err {
        ControlError::Busy => StatusCode::CONFLICT,
        ControlError::InvalidDuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ControlError::Api(e) => api_status(e),
    };
    reject(status, err.to_string(), err.error_code())
}

fn require_admin(state: &AppState) -> Result<(), (StatusCode, Json<ApiResponse>)> {
    if state.session.is_admin() {
        Ok(())
    } else {
        Err(reject(
            StatusCode::FORBIDDEN,
            "Admin access required to control timer".to_string(),
            "control.forbidden",
        ))
    }
}

fn accepted(state: &AppState, action: &str, message: String) -> HandlerResult {
    state.record_action(action);
    Ok(Json(ApiResponse::ok(message)))
}

/// Handle GET /status - Return the rendered dashboard
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let frame = state.current_frame();
    let snapshot = state.latest_snapshot();
    let user = state.session.user();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        room: state.room_id.clone(),
        view: state.view.current(),
        session: SessionSummary {
            authenticated: state.session.is_authenticated(),
            admin: state.session.is_admin(),
            username: user.map(|u| u.username),
        },
        snapshot_received: snapshot.is_some(),
        updated_at: snapshot.as_ref().and_then(|s| s.updated_at),
        stopwatch: StopwatchStatus::from_frame(&frame),
        countdown: CountdownStatus::from_frame(&frame, state.countdown.is_complete()),
        controls: state.affordances(),
        sensors: snapshot.map(|s| s.sensors),
        clock: ClockDisplay::render(&state.clock.now().with_timezone(&Local)),
        notices: state.notices.recent(),
        last_action,
        last_action_time,
        uptime: state.get_uptime(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Handle POST /login - Exchange credentials for a session
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> HandlerResult {
    match state.auth.login(&request.username, &request.password).await {
        Ok(user) => accepted(&state, "login", format!("Logged in as {}", user.username)),
        Err(e) => {
            warn!(error = %e, "Login failed");
            Err(reject(api_status(&e), e.to_string(), e.error_code()))
        }
    }
}

/// Handle POST /refresh - Renew the access token
pub async fn refresh_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    match state.auth.refresh().await {
        Ok(user) => accepted(&state, "refresh", format!("Session renewed for {}", user.username)),
        Err(e) => {
            warn!(error = %e, "Session refresh failed");
            Err(reject(api_status(&e), e.to_string(), e.error_code()))
        }
    }
}

/// Handle POST /logout - End the session
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> HandlerResult {
    // The local session is gone even if the service call failed
    if let Err(e) = state.auth.logout().await {
        warn!(error = %e, "Service logout failed");
    }
    accepted(&state, "logout", "Logged out".to_string())
}

/// Handle POST /timer/op/:action - Start, stop or reset the operation timer
pub async fn operation_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
) -> HandlerResult {
    require_admin(&state)?;
    let action: TimerAction = action
        .parse()
        .map_err(|e: String| reject(StatusCode::NOT_FOUND, e, "control.unknown_action"))?;

    let result = match action {
        TimerAction::Start => state.stopwatch.start().await,
        TimerAction::Stop => state.stopwatch.stop().await,
        TimerAction::Reset => state.stopwatch.reset().await,
    };

    match result {
        Ok(message) => {
            info!("Operation timer {} requested", action);
            accepted(&state, &format!("op-{action}"), message)
        }
        Err(e) => Err(control_failure(e)),
    }
}

/// Handle POST /timer/cd/start - Start a countdown run
pub async fn countdown_start_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CountdownStartRequest>,
) -> HandlerResult {
    require_admin(&state)?;
    match state.countdown.start(request.duration_minutes).await {
        Ok(message) => accepted(&state, "cd-start", message),
        Err(e) => Err(control_failure(e)),
    }
}

/// Handle POST /timer/cd/:action - Pause or reset the countdown
pub async fn countdown_action_handler(
    State(state): State<Arc<AppState>>,
    Path(action): Path<String>,
) -> HandlerResult {
    require_admin(&state)?;
    let result = match action.parse::<TimerAction>() {
        Ok(TimerAction::Stop) => state.countdown.stop().await,
        Ok(TimerAction::Reset) => state.countdown.reset().await,
        Ok(TimerAction::Start) => {
            return Err(reject(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Countdown start needs a duration".to_string(),
                "control.invalid_duration",
            ))
        }
        Err(e) => return Err(reject(StatusCode::NOT_FOUND, e, "control.unknown_action")),
    };

    match result {
        Ok(message) => accepted(&state, &format!("cd-{action}"), message),
        Err(e) => Err(control_failure(e)),
    }
}

/// Handle PATCH /timer/cd/adjust - Shift the countdown by one minute
pub async fn countdown_adjust_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustRequest>,
) -> HandlerResult {
    require_admin(&state)?;
    let step = AdjustStep::try_from(request.minutes)
        .map_err(|e| reject(StatusCode::UNPROCESSABLE_ENTITY, e, "control.invalid_adjust"))?;

    match state.countdown.adjust(step).await {
        Ok(message) => accepted(&state, "cd-adjust", message),
        Err(e) => Err(control_failure(e)),
    }
}
