//! Crate-wide error type and the `(code, retriable)` mapping used by the
//! operation envelope (see [`crate::ops::ErrorShape`]).

use uuid::Uuid;

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds, transport-agnostic, mapped to the response envelope (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("cascade violation: {0}")]
    CascadeViolation(String),

    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal invariant breach: {0}")]
    Internal(String),
}

impl Error {
    /// Event/memory/procedure lookup failed for the given id.
    #[must_use]
    pub fn not_found_id(kind: &str, id: Uuid) -> Self {
        Error::NotFound(format!("{kind} {id}"))
    }

    /// Error code used in the response envelope's `code` field.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::NotFound(_) => "NOT_FOUND",
            Error::RateLimited(_) => "RATE_LIMITED",
            Error::CascadeViolation(_) => "CASCADE_VIOLATION",
            Error::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            Error::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            Error::Storage(_) | Error::Internal(_) => "INTERNAL",
            Error::Serialization(_) => "INVALID_ARGUMENT",
            Error::Configuration(_) => "INVALID_ARGUMENT",
        }
    }

    /// Whether a caller may usefully retry the same request.
    #[must_use]
    pub fn retriable(&self) -> bool {
        matches!(
            self,
            Error::RateLimited(_) | Error::DeadlineExceeded(_) | Error::DependencyUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_violation_is_not_retriable() {
        let err = Error::CascadeViolation("cycle".into());
        assert_eq!(err.code(), "CASCADE_VIOLATION");
        assert!(!err.retriable());
    }

    #[test]
    fn rate_limited_is_retriable() {
        let err = Error::RateLimited("hook:session_start".into());
        assert!(err.retriable());
    }

    #[test]
    fn not_found_id_formats_kind_and_id() {
        let id = Uuid::nil();
        let err = Error::not_found_id("event", id);
        assert_eq!(err.to_string(), format!("not found: event {id}"));
    }
}
