//! Shared types for the operation registry's external interface layer (spec
//! §4.6): the summary-first envelope, pagination, the typed `Operation`
//! trait, and the layer namespace the concrete registry in `memory-ops`
//! validates against.

use serde::{Deserialize, Serialize};

use crate::context::EngineContext;
use crate::error::{Error, Result};
use crate::types::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

/// The eight layers operations are namespaced under (spec §4.6).
pub const LAYERS: &[&str] = &[
    "episodic",
    "semantic",
    "procedural",
    "prospective",
    "graph",
    "meta",
    "consolidation",
    "recall",
];

/// Argument key fragments that must never appear in operation arguments
/// (spec §6 "Credentials never cross the operation API").
const CREDENTIAL_MARKERS: &[&str] = &["password", "secret", "api_key", "apikey", "token", "credential"];

/// Pagination block attached to list/search envelopes (spec §4.6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
    pub total: usize,
    pub has_more: bool,
}

impl Pagination {
    #[must_use]
    pub fn new(requested_limit: Option<usize>, offset: usize, total: usize) -> Self {
        let limit = requested_limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
        Self {
            limit,
            offset,
            total,
            has_more: offset + limit < total,
        }
    }
}

/// The `{status: "error", code, message, retriable}` shape (spec §6
/// "Error shape").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorShape {
    pub code: String,
    pub message: String,
    pub retriable: bool,
}

impl From<&Error> for ErrorShape {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            retriable: err.retriable(),
        }
    }
}

/// The summary-first response envelope every operation returns (spec §4.6).
/// List/search operations populate `counts`/`pagination` and omit full
/// objects from `data` unless the caller passed an id filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub status: EnvelopeStatus,
    pub summary: String,
    pub data: serde_json::Value,
    pub counts: serde_json::Value,
    pub pagination: Option<Pagination>,
    pub drill_down: Option<String>,
    pub error: Option<ErrorShape>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeStatus {
    Ok,
    Error,
}

impl Envelope {
    #[must_use]
    pub fn ok(summary: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            status: EnvelopeStatus::Ok,
            summary: summary.into(),
            data,
            counts: serde_json::json!({}),
            pagination: None,
            drill_down: None,
            error: None,
        }
    }

    #[must_use]
    pub fn paginated(summary: impl Into<String>, data: serde_json::Value, counts: serde_json::Value, pagination: Pagination) -> Self {
        Self {
            status: EnvelopeStatus::Ok,
            summary: summary.into(),
            data,
            counts,
            pagination: Some(pagination),
            drill_down: None,
            error: None,
        }
    }

    #[must_use]
    pub fn with_drill_down(mut self, operation_id: impl Into<String>) -> Self {
        self.drill_down = Some(operation_id.into());
        self
    }

    #[must_use]
    pub fn error(err: &Error) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            summary: err.to_string(),
            data: serde_json::Value::Null,
            counts: serde_json::json!({}),
            pagination: None,
            drill_down: None,
            error: Some(ErrorShape::from(err)),
        }
    }
}

/// A first-class operation handler (spec §9 redesign flag: typed registry
/// over dynamic dispatch through a monolithic handler).
#[async_trait::async_trait]
pub trait Operation: Send + Sync {
    /// Fully-namespaced id, e.g. `"semantic.search"` (spec §4.6).
    fn id(&self) -> &'static str;

    /// JSON-schema-like description of accepted arguments, returned by
    /// `describe_operation` (spec §4.6).
    fn schema(&self) -> serde_json::Value;

    async fn execute(&self, ctx: &EngineContext, project_id: &str, args: serde_json::Value) -> Result<Envelope>;
}

/// Validate that `operation_id` is `"{layer}.{name}"` for a known layer
/// (spec §4.6 "flat namespace of operations organised by layer").
pub fn validate_layer_namespace(operation_id: &str) -> Result<()> {
    let Some((layer, name)) = operation_id.split_once('.') else {
        return Err(Error::InvalidArgument(format!(
            "operation id '{operation_id}' must be namespaced as 'layer.name'"
        )));
    };
    if name.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "operation id '{operation_id}' is missing a name after the layer"
        )));
    }
    if !LAYERS.contains(&layer) {
        return Err(Error::InvalidArgument(format!(
            "unknown operation layer '{layer}'; must be one of {LAYERS:?}"
        )));
    }
    Ok(())
}

/// Reject arguments whose keys look like credentials (spec §6 "Credentials
/// never cross the operation API; sources read them from the environment").
pub fn reject_credential_args(args: &serde_json::Value) -> Result<()> {
    let serde_json::Value::Object(map) = args else {
        return Ok(());
    };
    for key in map.keys() {
        let lowered = key.to_lowercase();
        if CREDENTIAL_MARKERS.iter().any(|m| lowered.contains(m)) {
            return Err(Error::InvalidArgument(format!(
                "argument '{key}' looks like a credential; credentials must be read from the environment"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_operation_id_validates() {
        assert!(validate_layer_namespace("semantic.search").is_ok());
    }

    #[test]
    fn unknown_layer_is_rejected() {
        assert!(validate_layer_namespace("bogus.search").is_err());
    }

    #[test]
    fn missing_separator_is_rejected() {
        assert!(validate_layer_namespace("search").is_err());
    }

    #[test]
    fn credential_like_argument_is_rejected() {
        let args = serde_json::json!({"api_key": "sk-123"});
        assert!(reject_credential_args(&args).is_err());
    }

    #[test]
    fn ordinary_arguments_pass() {
        let args = serde_json::json!({"query_text": "hello", "k": 5});
        assert!(reject_credential_args(&args).is_ok());
    }

    #[test]
    fn pagination_flags_has_more_when_total_exceeds_window() {
        let page = Pagination::new(Some(10), 0, 25);
        assert!(page.has_more);
        assert_eq!(page.limit, 10);
    }

    #[test]
    fn pagination_clamps_limit_to_max() {
        let page = Pagination::new(Some(1_000), 0, 5);
        assert_eq!(page.limit, MAX_PAGE_LIMIT);
    }
}
