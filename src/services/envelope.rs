//! The `{success, data | message}` wrapper every service response uses

use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Deserialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    fn failure_message(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// Turn a raw status + body into the envelope's payload or an [`ApiError`]
pub fn unwrap_data<T: DeserializeOwned>(
    url: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<T, ApiError> {
    let envelope = check::<T>(url, status, body)?;
    envelope.data.ok_or_else(|| ApiError::Decode {
        url: url.to_string(),
        detail: "response has no data".to_string(),
    })
}

/// Like [`unwrap_data`] but for endpoints that only answer with a message
pub fn unwrap_message(url: &str, status: StatusCode, body: &[u8]) -> Result<String, ApiError> {
    let envelope = check::<serde_json::Value>(url, status, body)?;
    Ok(envelope.message.unwrap_or_default())
}

fn check<T: DeserializeOwned>(
    url: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<Envelope<T>, ApiError> {
    let fallback = status.canonical_reason().unwrap_or("Request failed");

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized {
            message: failure_message(body).unwrap_or_else(|| fallback.to_string()),
        });
    }

    if !status.is_success() {
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message: failure_message(body).unwrap_or_else(|| fallback.to_string()),
        });
    }

    let envelope: Envelope<T> = serde_json::from_slice(body).map_err(|e| ApiError::Decode {
        url: url.to_string(),
        detail: e.to_string(),
    })?;

    if !envelope.success {
        return Err(ApiError::Application {
            message: envelope.failure_message("Request was not successful"),
        });
    }

    Ok(envelope)
}

/// Best-effort message from an error body, envelope or not
pub fn failure_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct Loose {
        message: Option<String>,
        error: Option<String>,
    }

    serde_json::from_slice::<Loose>(body)
        .ok()
        .and_then(|loose| loose.message.or(loose.error))
        .filter(|m| !m.is_empty())
}
