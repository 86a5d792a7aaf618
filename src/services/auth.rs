//! Login and logout against the monitoring service

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use super::{
    endpoints,
    http::{ApiRequest, AuthPayload, SessionHttpClient},
};
use crate::{
    error::ApiError,
    state::{LoginBoundary, SessionStore, User, ViewRouter},
};

pub struct AuthService {
    http: Arc<SessionHttpClient>,
    session: Arc<SessionStore>,
    view: Arc<ViewRouter>,
}

impl AuthService {
    pub fn new(http: Arc<SessionHttpClient>, view: Arc<ViewRouter>) -> Self {
        let session = Arc::clone(http.session());
        Self { http, session, view }
    }

    /// Exchange credentials for a session and enter the room view
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let auth: AuthPayload = self
            .http
            .send_json(
                ApiRequest::post(endpoints::AUTH_LOGIN)
                    .json(json!({ "username": username, "password": password })),
            )
            .await?;

        info!("Logged in as {} ({:?})", auth.user.username, auth.user.role);
        self.session.set_auth(auth.user.clone(), auth.access_token);
        self.view.enter_room();
        Ok(auth.user)
    }

    /// Renew the access token from the refresh credential, e.g. on startup
    pub async fn refresh(&self) -> Result<User, ApiError> {
        let auth = self.http.refresh_session().await?;
        self.view.enter_room();
        Ok(auth.user)
    }

    /// Tell the service we are leaving; the local session is dropped either way
    pub async fn logout(&self) -> Result<String, ApiError> {
        let result = self
            .http
            .send_message(ApiRequest::post(endpoints::AUTH_LOGOUT))
            .await;

        if let Err(e) = &result {
            warn!(error = %e, "Logout call failed, clearing local session anyway");
        }
        self.session.clear_auth();
        self.view.redirect_to_login();
        result
    }
}
