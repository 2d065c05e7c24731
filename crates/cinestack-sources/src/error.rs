use reqwest::StatusCode;
use thiserror::Error;

/// Transport-level outcome of a request that did not succeed.
///
/// `Clone` so one failed request can be handed to every caller sharing it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("request rejected with {status}: {body}")]
    ClientError { status: u16, body: String },

    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },

    /// 401, kept apart from other 4xx so callers can ask the user to sign in again
    #[error("credential rejected or expired")]
    AuthExpired,

    #[error("no response from server: {0}")]
    NetworkUnavailable(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ClientError { status, .. } | ApiError::ServerError { status, .. } => Some(*status),
            ApiError::AuthExpired => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::NetworkUnavailable(err.to_string())
        }
    }

    pub(crate) fn from_body(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::NetworkUnavailable(err.to_string())
        }
    }
}

/// Classify a response status; `None` means success
pub fn classify_status(status: StatusCode, body: String) -> Option<ApiError> {
    if status == StatusCode::UNAUTHORIZED {
        Some(ApiError::AuthExpired)
    } else if status.is_client_error() {
        Some(ApiError::ClientError { status: status.as_u16(), body })
    } else if status.is_server_error() {
        Some(ApiError::ServerError { status: status.as_u16(), body })
    } else {
        None
    }
}
