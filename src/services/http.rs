//! Authenticated HTTP access to the monitoring service
//!
//! Every request carries the current bearer token. A 401 triggers one token
//! refresh on a separate channel (no bearer, no recovery of its own) and, if
//! that succeeds, exactly one replay of the original request. If the refresh
//! fails the session is cleared, the dashboard is sent to the login view and
//! the caller sees the original 401.

use std::{sync::Arc, time::Duration};

use reqwest::{cookie::Jar, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{endpoints, envelope};
use crate::{
    error::ApiError,
    state::{LoginBoundary, SessionStore, User},
};

/// A request that can be rebuilt, so it can be sent again after a refresh
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// What login and refresh hand back
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    pub access_token: String,
    pub user: User,
}

/// Settings for [`SessionHttpClient`]
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub refresh_timeout: Duration,
}

impl HttpConfig {
    /// Defaults: 30 s per request, 10 s for refresh
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(10),
        }
    }
}

pub struct SessionHttpClient {
    base_url: String,
    client: Client,
    refresh_client: Client,
    session: Arc<SessionStore>,
    boundary: Arc<dyn LoginBoundary>,
}

impl SessionHttpClient {
    pub fn new(
        config: HttpConfig,
        session: Arc<SessionStore>,
        boundary: Arc<dyn LoginBoundary>,
    ) -> Result<Self, ApiError> {
        // The refresh credential is an out-of-band cookie, so both channels share a jar
        let jar = Arc::new(Jar::default());

        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::ClientSetup { detail: e.to_string() })?;
        let refresh_client = Client::builder()
            .cookie_provider(jar)
            .timeout(config.refresh_timeout)
            .build()
            .map_err(|e| ApiError::ClientSetup { detail: e.to_string() })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            refresh_client,
            session,
            boundary,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn build(&self, client: &Client, request: &ApiRequest, token: Option<&str>) -> RequestBuilder {
        let mut builder = client.request(request.method.clone(), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn dispatch(
        &self,
        client: &Client,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        self.build(client, request, token)
            .send()
            .await
            .map_err(|e| ApiError::Transport {
                url: self.url(&request.path),
                detail: e.to_string(),
            })
    }

    /// Send `request` with 401 recovery; returns the final status and body
    pub async fn execute(&self, request: &ApiRequest) -> Result<(StatusCode, Vec<u8>), ApiError> {
        let token = self.session.access_token();
        let (status, body) = read(self.dispatch(&self.client, request, token.as_deref()).await?).await?;

        if status != StatusCode::UNAUTHORIZED {
            return Ok((status, body));
        }

        let original = ApiError::Unauthorized {
            message: envelope::failure_message(&body).unwrap_or_else(|| "Unauthorized".to_string()),
        };
        warn!(path = %request.path, "Request unauthorized, refreshing access token");

        match self.refresh_session().await {
            Ok(auth) => {
                debug!(path = %request.path, "Replaying request with refreshed token");
                read(
                    self.dispatch(&self.client, request, Some(&auth.access_token))
                        .await?,
                )
                .await
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.session.clear_auth();
                self.boundary.redirect_to_login();
                Err(original)
            }
        }
    }

    /// Ask for a new access token on the dedicated refresh channel
    pub async fn refresh_session(&self) -> Result<AuthPayload, ApiError> {
        let request = ApiRequest::post(endpoints::AUTH_REFRESH);
        let url = self.url(&request.path);
        let (status, body) = read(self.dispatch(&self.refresh_client, &request, None).await?).await?;

        let auth = parse_refresh(&url, status, &body)?;

        info!("Access token refreshed for {}", auth.user.username);
        self.session.set_auth(auth.user.clone(), auth.access_token.clone());
        Ok(auth)
    }

    /// Send and unwrap the envelope's `data`
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let (status, body) = self.execute(&request).await?;
        envelope::unwrap_data(&self.url(&request.path), status, &body)
    }

    /// Send and unwrap the envelope's `message`
    pub async fn send_message(&self, request: ApiRequest) -> Result<String, ApiError> {
        let (status, body) = self.execute(&request).await?;
        envelope::unwrap_message(&self.url(&request.path), status, &body)
    }
}

/// Refresh answers either with the usual envelope or with a bare `{access_token, user}`
fn parse_refresh(url: &str, status: StatusCode, body: &[u8]) -> Result<AuthPayload, ApiError> {
    match envelope::unwrap_data::<AuthPayload>(url, status, body) {
        Ok(auth) => Ok(auth),
        Err(e) if status.is_success() => serde_json::from_slice::<AuthPayload>(body).map_err(|_| e),
        Err(e) => Err(e),
    }
}

async fn read(response: Response) -> Result<(StatusCode, Vec<u8>), ApiError> {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.bytes().await.map_err(|e| ApiError::Transport {
        url,
        detail: e.to_string(),
    })?;
    Ok((status, body.to_vec()))
}
