//! Error types shared by the session layer, the engines and the local API

use thiserror::Error;

/// Failures of a single request against the remote monitoring service
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// No response was received at all
    #[error("Network error calling {url}: {detail}")]
    Transport { url: String, detail: String },

    /// 401 that could not be recovered by a refresh
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Non-success HTTP status, message taken verbatim from the envelope when present
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// HTTP success but the envelope said `success: false`
    #[error("{message}")]
    Application { message: String },

    /// The HTTP client itself could not be built
    #[error("Failed to set up HTTP client: {detail}")]
    ClientSetup { detail: String },

    /// The body did not match the expected envelope shape
    #[error("Failed to decode response from {url}: {detail}")]
    Decode { url: String, detail: String },
}

impl ApiError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Transport { .. } => "api.transport_failed",
            ApiError::Unauthorized { .. } => "api.unauthorized",
            ApiError::Rejected { .. } => "api.rejected",
            ApiError::Application { .. } => "api.application_failure",
            ApiError::Decode { .. } => "api.decode_failed",
            ApiError::ClientSetup { .. } => "api.client_setup_failed",
        }
    }

    /// Errors the user caused and can fix by changing their input
    pub fn is_user_error(&self) -> bool {
        match self {
            ApiError::Rejected { status, .. } => (400..500).contains(status) && *status != 401,
            ApiError::Application { .. } => true,
            _ => false,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

/// Failures of a control intent issued through an engine
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ControlError {
    #[error("Another timer action is still in progress")]
    Busy,

    #[error("Countdown duration must be at least 1 minute (got {0})")]
    InvalidDuration(u32),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ControlError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ControlError::Busy => "control.busy",
            ControlError::InvalidDuration(_) => "control.invalid_duration",
            ControlError::Api(e) => e.error_code(),
        }
    }
}

/// Failures reading or writing the persisted session
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Failed to access session file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file {path} is not valid JSON")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
