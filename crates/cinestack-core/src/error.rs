use cinestack_models::CatalogKey;
use cinestack_sources::ApiError;
use thiserror::Error;

/// Outcome classes callers branch on
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already in playlist: {0}")]
    DuplicateItem(String),

    #[error("catalog provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("request timed out")]
    Timeout,

    #[error("session expired, sign in again")]
    AuthExpired,

    #[error("could not save: {0}")]
    PersistenceError(String),

    #[error("invalid input: {0}")]
    ValidationError(String),
}

impl CineError {
    /// Transient failures: show a retry affordance, never abort the flow
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CineError::NetworkUnavailable(_) | CineError::UpstreamUnavailable(_) | CineError::Timeout
        )
    }

    /// The only class that interrupts the current flow
    pub fn requires_reauth(&self) -> bool {
        matches!(self, CineError::AuthExpired)
    }

    /// Failure talking to the catalog provider about `key`
    pub fn from_provider(err: ApiError, key: CatalogKey) -> Self {
        match err {
            ApiError::AuthExpired => CineError::AuthExpired,
            e if e.is_not_found() => CineError::NotFound(format!("catalog title {}", key)),
            e => CineError::UpstreamUnavailable(e.to_string()),
        }
    }

    /// Failure fetching a listing or search page
    pub fn from_listing(err: ApiError) -> Self {
        match err {
            ApiError::AuthExpired => CineError::AuthExpired,
            ApiError::Timeout => CineError::Timeout,
            ApiError::NetworkUnavailable(msg) => CineError::NetworkUnavailable(msg),
            ApiError::ClientError { status: 400, body } => CineError::ValidationError(body),
            e => CineError::UpstreamUnavailable(e.to_string()),
        }
    }

    /// Failure reading or writing a local record. Only a rejected write is a
    /// persistence error; an unreachable or failing backend stays retryable.
    pub fn from_persistence(err: ApiError) -> Self {
        match err {
            ApiError::AuthExpired => CineError::AuthExpired,
            ApiError::Timeout => CineError::Timeout,
            ApiError::NetworkUnavailable(msg) => CineError::NetworkUnavailable(msg),
            ApiError::ServerError { status, body } => {
                CineError::UpstreamUnavailable(format!("backend error {}: {}", status, body))
            }
            e => CineError::PersistenceError(e.to_string()),
        }
    }

    /// Failure adding `movie_id` to a playlist. The backend rejects duplicates with 400/409.
    pub fn from_add_item(err: ApiError, playlist_id: u64, movie_id: u64) -> Self {
        match err.status() {
            Some(400) | Some(409) => {
                CineError::DuplicateItem(format!("movie {} in playlist {}", movie_id, playlist_id))
            }
            _ => CineError::from(err),
        }
    }
}

impl From<ApiError> for CineError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::AuthExpired => CineError::AuthExpired,
            ApiError::Timeout => CineError::Timeout,
            ApiError::NetworkUnavailable(msg) => CineError::NetworkUnavailable(msg),
            ApiError::ClientError { status: 404, body } => CineError::NotFound(body),
            ApiError::ClientError { status: 409, body } => CineError::DuplicateItem(body),
            ApiError::ClientError { status: 400, body } => CineError::ValidationError(body),
            ApiError::ClientError { status, body } => {
                CineError::PersistenceError(format!("rejected with {}: {}", status, body))
            }
            ApiError::ServerError { status, body } => {
                CineError::UpstreamUnavailable(format!("server error {}: {}", status, body))
            }
            ApiError::Decode(msg) => CineError::PersistenceError(msg),
        }
    }
}
