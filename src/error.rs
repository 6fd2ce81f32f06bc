// ⚠️ Error Taxonomy
// Every failure the client can hit, from form validation to the wire

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Client-side validation failed; no request was issued
    #[error("{0}")]
    Validation(String),

    /// HTTP 401 - the session is no longer valid (or the credentials were wrong).
    /// Carries the body's `detail`/`message` when it had one.
    #[error("unauthorized: {}", .0.as_deref().unwrap_or("no details"))]
    Unauthorized(Option<String>),

    /// Any other non-2xx response
    #[error("server error {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Server { status: u16, message: Option<String> },

    /// The request never completed
    #[error("network error: {0}")]
    Network(String),

    /// A 2xx response whose body did not match the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Local session storage failed
    #[error("storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// True when the error must force the user back to the login screen
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Message the server sent with a rejected request, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized(msg) | ApiError::Server { message: msg, .. } => msg.as_deref(),
            _ => None,
        }
    }

    /// Message suitable for showing to the user as-is
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Unauthorized(None) => "Unauthorized".to_string(),
            ApiError::Unauthorized(Some(msg)) | ApiError::Server { message: Some(msg), .. } => {
                msg.clone()
            }
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
