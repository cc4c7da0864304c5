//! Error types for the cache
//!
//! Unified error handling using thiserror, with the retry classification the
//! API layer and clients use to distinguish transient from permanent failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// `MemoryLimitExceeded` and `InvalidKey` are reserved for future operations;
/// the current set/get/delete never raise them, but clients can already
/// classify them via [`CacheError::is_temporary`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    /// Operation attempted after close
    #[error("cache is closed")]
    Closed,

    /// Configuration rejected at construction
    #[error("invalid config field '{field}': {message}")]
    InvalidConfig {
        field: &'static str,
        message: String,
    },

    /// Reserved: key rejected by validation
    #[error("invalid key")]
    InvalidKey,

    /// Reserved: memory limit would be exceeded
    #[error("memory limit exceeded")]
    MemoryLimitExceeded,
}

impl CacheError {
    pub(crate) fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        CacheError::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    /// Returns true if the operation can be retried.
    pub fn is_temporary(&self) -> bool {
        matches!(self, CacheError::MemoryLimitExceeded)
    }

    /// Returns true if retrying cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            CacheError::Closed | CacheError::InvalidKey | CacheError::InvalidConfig { .. }
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::InvalidKey => StatusCode::BAD_REQUEST,
            CacheError::MemoryLimitExceeded => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::InvalidConfig { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
