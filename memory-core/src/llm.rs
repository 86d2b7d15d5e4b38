//! The LLM synthesis/validation client contract (spec §6).
//!
//! The concrete HTTP client is out of scope (spec §1); this module specifies
//! the trait boundary, the structured types it exchanges with System 2
//! validation and Tier-3 synthesis, and a scriptable mock for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

/// A request to the external LLM (spec §6 `complete`).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub schema: Option<serde_json::Value>,
    pub max_tokens: u32,
    pub deadline: Duration,
}

/// The response payload, either free text or schema-validated structured
/// output (spec §6 "must support structured output for validation").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: Option<String>,
    pub structured: Option<serde_json::Value>,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

/// System-2 validation verdict for a consolidation candidate (spec §4.2 step 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    pub refined_content: String,
    pub confidence: f64,
    pub category: String,
}

/// A Tier-3 synthesized answer grounded in recall results (spec §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub content: String,
    pub citations: Vec<uuid::Uuid>,
}

/// The LLM client contract. Time-bounded; callers must degrade on failure
/// (spec §6, §7 `DEPENDENCY_UNAVAILABLE`).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Whether the client currently believes the backing service is reachable.
    fn is_available(&self) -> bool {
        true
    }
}

/// A scriptable mock used by tests and by callers with no LLM configured.
/// `available = false` simulates `DEPENDENCY_UNAVAILABLE` for every call.
pub struct MockLlmClient {
    pub available: bool,
    pub structured_response: Option<serde_json::Value>,
    pub text_response: Option<String>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self {
            available: true,
            structured_response: None,
            text_response: Some("mock synthesis".to_string()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if !self.available {
            return Err(crate::error::Error::DependencyUnavailable(
                "llm offline".into(),
            ));
        }
        Ok(CompletionResponse {
            text: self.text_response.clone(),
            structured: self.structured_response.clone(),
            tokens_in: request.prompt.len() as u32 / 4,
            tokens_out: 32,
        })
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_mock_returns_dependency_unavailable() {
        let client = MockLlmClient {
            available: false,
            ..Default::default()
        };
        let req = CompletionRequest {
            prompt: "hi".into(),
            schema: None,
            max_tokens: 16,
            deadline: Duration::from_millis(100),
        };
        let err = client.complete(req).await.unwrap_err();
        assert_eq!(err.code(), "DEPENDENCY_UNAVAILABLE");
    }

    #[tokio::test]
    async fn available_mock_echoes_configured_response() {
        let client = MockLlmClient::default();
        let req = CompletionRequest {
            prompt: "hi".into(),
            schema: None,
            max_tokens: 16,
            deadline: Duration::from_millis(100),
        };
        let resp = client.complete(req).await.unwrap();
        assert_eq!(resp.text.as_deref(), Some("mock synthesis"));
    }
}
