//! In-process stand-in for the remote monitoring service

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use theater_dashboard::{
    services::{HttpConfig, SessionHttpClient},
    state::{Role, SessionStore, User, View, ViewRouter},
};

pub const REFRESHED_TOKEN: &str = "fresh-token";
pub const LOGIN_TOKEN: &str = "login-token";
pub const PASSWORD: &str = "secret";

pub struct Backend {
    pub valid_token: Mutex<String>,
    pub refresh_ok: AtomicBool,
    pub require_cookie: AtomicBool,
    pub bare_refresh: AtomicBool,
    pub always_unauthorized: AtomicBool,
    pub application_failure: AtomicBool,

    pub state_hits: AtomicUsize,
    pub refresh_hits: AtomicUsize,
    pub control_hits: AtomicUsize,

    pub state_auth: Mutex<Vec<Option<String>>>,
    pub refresh_auth: Mutex<Vec<Option<String>>>,
    pub control_bodies: Mutex<Vec<Value>>,

    pub op_running: AtomicBool,
    pub op_start: Mutex<Option<DateTime<Utc>>>,
    pub op_accumulated: Mutex<f64>,
    pub cd_target: Mutex<Option<DateTime<Utc>>>,
    pub cd_duration: Mutex<f64>,
}

impl Backend {
    fn new() -> Self {
        Self {
            valid_token: Mutex::new(LOGIN_TOKEN.to_string()),
            refresh_ok: AtomicBool::new(true),
            require_cookie: AtomicBool::new(false),
            bare_refresh: AtomicBool::new(false),
            always_unauthorized: AtomicBool::new(false),
            application_failure: AtomicBool::new(false),
            state_hits: AtomicUsize::new(0),
            refresh_hits: AtomicUsize::new(0),
            control_hits: AtomicUsize::new(0),
            state_auth: Mutex::new(Vec::new()),
            refresh_auth: Mutex::new(Vec::new()),
            control_bodies: Mutex::new(Vec::new()),
            op_running: AtomicBool::new(false),
            op_start: Mutex::new(None),
            op_accumulated: Mutex::new(0.0),
            cd_target: Mutex::new(None),
            cd_duration: Mutex::new(0.0),
        }
    }

    pub fn set_valid_token(&self, token: &str) {
        *self.valid_token.lock().unwrap() = token.to_string();
    }

    pub fn hits(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        if self.always_unauthorized.load(Ordering::SeqCst) {
            return false;
        }
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        bearer(headers).as_deref() == Some(expected.as_str())
    }

    fn snapshot(&self) -> Value {
        let cd_target = *self.cd_target.lock().unwrap();
        json!({
            "id": 1,
            "room_name": "OK 1",
            "ach_theoretical": 20.0,
            "ach_empirical": 18.5,
            "current_temp": 21.5,
            "current_pressure": 2.8,
            "current_humidity": 45.0,
            "current_logic_ahu": true,
            "op_is_running": self.op_running.load(Ordering::SeqCst),
            "op_start_time": *self.op_start.lock().unwrap(),
            "op_accumulated_seconds": *self.op_accumulated.lock().unwrap(),
            "cd_is_running": cd_target.is_some(),
            "cd_target_time": cd_target,
            "cd_duration_seconds": *self.cd_duration.lock().unwrap(),
            "ahu_cycle_start_time": null,
            "last_processed_raw_id": 10,
            "updated_at": Utc::now(),
        })
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "message": message })),
    )
        .into_response()
}

fn user_json(username: &str) -> Value {
    let role = if username == "admin" { "admin" } else { "user" };
    json!({ "id": 1, "username": username, "role": role })
}

async fn state_handler(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    backend.state_hits.fetch_add(1, Ordering::SeqCst);
    backend.state_auth.lock().unwrap().push(bearer(&headers));

    if !backend.authorized(&headers) {
        return unauthorized("Token expired");
    }
    if backend.application_failure.load(Ordering::SeqCst) || query.get("room").is_none() {
        return Json(json!({ "success": false, "message": "Room not found" })).into_response();
    }
    Json(json!({ "success": true, "data": backend.snapshot() })).into_response()
}

async fn refresh_handler(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    backend.refresh_hits.fetch_add(1, Ordering::SeqCst);
    backend.refresh_auth.lock().unwrap().push(bearer(&headers));

    let has_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|c| c.contains("refresh_token="));

    if !backend.refresh_ok.load(Ordering::SeqCst)
        || (backend.require_cookie.load(Ordering::SeqCst) && !has_cookie)
    {
        return unauthorized("Refresh token expired");
    }

    backend.set_valid_token(REFRESHED_TOKEN);
    if backend.bare_refresh.load(Ordering::SeqCst) {
        return Json(json!({ "access_token": REFRESHED_TOKEN, "user": user_json("admin") }))
            .into_response();
    }
    Json(json!({
        "success": true,
        "data": { "access_token": REFRESHED_TOKEN, "user": user_json("admin") }
    }))
    .into_response()
}

async fn login_handler(State(backend): State<Arc<Backend>>, Json(body): Json<Value>) -> Response {
    let username = body["username"].as_str().unwrap_or_default().to_string();
    if body["password"] != PASSWORD {
        return unauthorized("Invalid credentials");
    }

    backend.set_valid_token(LOGIN_TOKEN);
    (
        [(header::SET_COOKIE, "refresh_token=rt-1; Path=/; HttpOnly")],
        Json(json!({
            "success": true,
            "data": { "access_token": LOGIN_TOKEN, "user": user_json(&username) }
        })),
    )
        .into_response()
}

async fn logout_handler() -> Response {
    Json(json!({ "success": true, "message": "Logged out successfully" })).into_response()
}

async fn op_handler(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized("Token expired");
    }
    backend.control_hits.fetch_add(1, Ordering::SeqCst);
    backend.control_bodies.lock().unwrap().push(body.clone());

    match body["action"].as_str() {
        Some("start") => {
            backend.op_running.store(true, Ordering::SeqCst);
            *backend.op_start.lock().unwrap() = Some(Utc::now());
        }
        Some("stop") => backend.op_running.store(false, Ordering::SeqCst),
        Some("reset") => {
            backend.op_running.store(false, Ordering::SeqCst);
            *backend.op_start.lock().unwrap() = None;
            *backend.op_accumulated.lock().unwrap() = 0.0;
        }
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": "Invalid action" })),
            )
                .into_response()
        }
    }
    Json(json!({ "success": true, "message": "Operation timer updated" })).into_response()
}

async fn cd_handler(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized("Token expired");
    }
    backend.control_hits.fetch_add(1, Ordering::SeqCst);
    backend.control_bodies.lock().unwrap().push(body.clone());

    match body["action"].as_str() {
        Some("start") => {
            let Some(minutes) = body["duration_minutes"].as_i64() else {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "success": false, "message": "duration_minutes required" })),
                )
                    .into_response();
            };
            *backend.cd_target.lock().unwrap() = Some(Utc::now() + Duration::minutes(minutes));
            *backend.cd_duration.lock().unwrap() = (minutes * 60) as f64;
        }
        Some("stop") | Some("reset") => *backend.cd_target.lock().unwrap() = None,
        _ => {}
    }
    Json(json!({ "success": true, "message": "Countdown updated" })).into_response()
}

async fn adjust_handler(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !backend.authorized(&headers) {
        return unauthorized("Token expired");
    }
    backend.control_hits.fetch_add(1, Ordering::SeqCst);
    backend.control_bodies.lock().unwrap().push(body.clone());

    let minutes = body["minutes"].as_i64().unwrap_or_default();
    if let Some(target) = backend.cd_target.lock().unwrap().as_mut() {
        *target += Duration::minutes(minutes);
    }
    Json(json!({ "success": true, "message": "Countdown adjusted" })).into_response()
}

/// Start the fake service on an ephemeral port
pub async fn spawn_backend() -> (String, Arc<Backend>) {
    let backend = Arc::new(Backend::new());
    let app = Router::new()
        .route("/theater/state", get(state_handler))
        .route("/theater/timer/op", post(op_handler))
        .route("/theater/timer/cd", post(cd_handler))
        .route("/theater/timer/cd/adjust", patch(adjust_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/refresh", post(refresh_handler))
        .with_state(Arc::clone(&backend));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), backend)
}

pub fn admin() -> User {
    User { id: 1, username: "admin".into(), role: Role::Admin }
}

pub fn session_with(token: Option<&str>) -> Arc<SessionStore> {
    let session = Arc::new(SessionStore::in_memory());
    if let Some(token) = token {
        session.set_auth(admin(), token.to_string());
    }
    session
}

pub fn http_client(
    base_url: &str,
    session: &Arc<SessionStore>,
    view: &Arc<ViewRouter>,
) -> Arc<SessionHttpClient> {
    Arc::new(SessionHttpClient::new(
        HttpConfig::new(base_url),
        Arc::clone(session),
        view.clone(),
    )
    .unwrap())
}

pub fn room_view() -> Arc<ViewRouter> {
    Arc::new(ViewRouter::new(View::Room))
}
