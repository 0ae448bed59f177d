//! Error payload returned to API clients.

use serde::{Deserialize, Serialize};

/// API error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable error message.
    pub error: String,
    /// Machine-readable error code (see [`error_codes`]).
    pub code: String,
}

impl ApiError {
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.error, self.code)
    }
}

impl std::error::Error for ApiError {}

/// Standard API error codes.
pub mod error_codes {
    /// Requester lacks permission for this action.
    pub const FORBIDDEN: &str = "FORBIDDEN";
    /// Requested resource does not exist.
    pub const NOT_FOUND: &str = "NOT_FOUND";
    /// Request data failed validation (malformed replay, bad title, ...).
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    /// Resource already exists or changed underneath the request.
    pub const CONFLICT: &str = "CONFLICT";
    /// Rate limit hit; retry later.
    pub const TOO_MANY_REQUESTS: &str = "TOO_MANY_REQUESTS";
    /// Storage failed; the request may be retried by the caller.
    pub const INTERNAL: &str = "INTERNAL";
}
