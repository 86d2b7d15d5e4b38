//! System 2 (slow, LLM-validated) review of uncertain candidates (spec §4.2
//! step 4).

use std::time::Duration;

use crate::llm::{CompletionRequest, LlmClient, ValidationVerdict};

use super::extraction::PatternCandidate;

/// Outcome of routing one candidate through System 2, or through the fast
/// path when validation is skipped.
pub enum Disposition {
    /// Accepted, possibly with LLM-refined content.
    Accepted { content: String, confidence: f64 },
    /// Rejected by System 2 as not a real pattern.
    Rejected,
    /// LLM unavailable or timed out; candidate is deferred to the next run
    /// rather than silently dropped or falsely promoted.
    Deferred,
}

fn validation_prompt(candidate: &PatternCandidate) -> String {
    format!(
        "Evaluate this candidate memory extracted from {} correlated events (cohesion {:.2}): \"{}\". \
         Reply with whether it is a genuine, reusable pattern.",
        candidate.support_count, candidate.cohesion, candidate.content
    )
}

/// Validate a single candidate against the LLM, honoring `deadline`. Network
/// failure or timeout yields [`Disposition::Deferred`] rather than an error,
/// matching spec §7's guidance that `DEPENDENCY_UNAVAILABLE` is recoverable.
pub async fn validate_candidate(
    llm: &dyn LlmClient,
    candidate: &PatternCandidate,
    deadline: Duration,
) -> Disposition {
    if !llm.is_available() {
        return Disposition::Deferred;
    }
    let request = CompletionRequest {
        prompt: validation_prompt(candidate),
        schema: Some(serde_json::json!({
            "type": "object",
            "properties": {
                "valid": {"type": "boolean"},
                "refined_content": {"type": "string"},
                "confidence": {"type": "number"},
                "category": {"type": "string"},
            },
            "required": ["valid", "refined_content", "confidence", "category"],
        })),
        max_tokens: 256,
        deadline,
    };

    let outcome = tokio::time::timeout(deadline, llm.complete(request)).await;
    let Ok(result) = outcome else {
        return Disposition::Deferred;
    };
    let Ok(response) = result else {
        return Disposition::Deferred;
    };
    let Some(structured) = response.structured else {
        return Disposition::Deferred;
    };
    let Ok(verdict) = serde_json::from_value::<ValidationVerdict>(structured) else {
        return Disposition::Deferred;
    };
    if verdict.valid {
        Disposition::Accepted {
            content: verdict.refined_content,
            confidence: verdict.confidence,
        }
    } else {
        Disposition::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::types::MemoryType;

    fn candidate() -> PatternCandidate {
        PatternCandidate {
            content: "always check lockfile before upgrading".into(),
            memory_type: MemoryType::Pattern,
            is_procedural: false,
            support_count: 4,
            cohesion: 0.8,
            outcome_variance: 0.0,
            uncertainty: 0.6,
            source_event_ids: vec![],
        }
    }

    #[tokio::test]
    async fn unavailable_llm_defers() {
        let llm = MockLlmClient {
            available: false,
            ..Default::default()
        };
        let disposition = validate_candidate(&llm, &candidate(), Duration::from_millis(100)).await;
        assert!(matches!(disposition, Disposition::Deferred));
    }

    #[tokio::test]
    async fn valid_structured_response_is_accepted() {
        let llm = MockLlmClient {
            available: true,
            structured_response: Some(serde_json::json!({
                "valid": true,
                "refined_content": "refined text",
                "confidence": 0.9,
                "category": "pattern",
            })),
            text_response: None,
        };
        let disposition = validate_candidate(&llm, &candidate(), Duration::from_millis(100)).await;
        match disposition {
            Disposition::Accepted { content, confidence } => {
                assert_eq!(content, "refined text");
                assert!((confidence - 0.9).abs() < 1e-9);
            }
            _ => panic!("expected accepted"),
        }
    }

    #[tokio::test]
    async fn invalid_structured_response_is_rejected() {
        let llm = MockLlmClient {
            available: true,
            structured_response: Some(serde_json::json!({
                "valid": false,
                "refined_content": "",
                "confidence": 0.1,
                "category": "noise",
            })),
            text_response: None,
        };
        let disposition = validate_candidate(&llm, &candidate(), Duration::from_millis(100)).await;
        assert!(matches!(disposition, Disposition::Rejected));
    }

    #[tokio::test]
    async fn missing_structured_payload_defers() {
        let llm = MockLlmClient {
            available: true,
            structured_response: None,
            text_response: Some("free text".into()),
        };
        let disposition = validate_candidate(&llm, &candidate(), Duration::from_millis(100)).await;
        assert!(matches!(disposition, Disposition::Deferred));
    }
}
