//! The hook dispatcher: fires lifecycle events through the idempotency,
//! rate-limit, and cascade guards, persisting every successful fire as an
//! episodic event (spec §4.4).

pub mod cascade;
pub mod idempotency;
pub mod rate_limiter;
pub mod session;
pub mod vocabulary;

use chrono::Utc;
use uuid::Uuid;

use crate::config::HooksConfig;
use crate::error::{Error, Result};
use crate::storage::StorageBackend;
use crate::types::{Event, EventType, Outcome};

pub use cascade::{CascadeStack, CascadeViolationReason};
pub use idempotency::IdempotencyGuard;
pub use rate_limiter::HookRateLimiter;
pub use vocabulary::{HookArgs, HookId};

fn event_type_for(hook_id: HookId) -> EventType {
    match hook_id {
        HookId::ErrorOccurred => EventType::Error,
        HookId::TaskCompleted | HookId::ConsolidationComplete => EventType::Success,
        HookId::UserPromptSubmit | HookId::ConversationTurn | HookId::AssistantResponse => EventType::Conversation,
        _ => EventType::Action,
    }
}

fn outcome_for(hook_id: HookId) -> Outcome {
    match hook_id {
        HookId::ErrorOccurred => Outcome::Failure,
        HookId::TaskCompleted | HookId::ConsolidationComplete => Outcome::Success,
        _ => Outcome::None,
    }
}

/// Dispatches hook fires for one engine instance. Owns the idempotency
/// cache and rate limiter; the cascade stack is per fire-chain and supplied
/// by the caller (spec §4.4 "task-local state").
pub struct HookDispatcher {
    idempotency: IdempotencyGuard,
    rate_limiter: HookRateLimiter,
    max_depth: usize,
    max_breadth: usize,
}

impl HookDispatcher {
    #[must_use]
    pub fn new(config: &HooksConfig) -> Self {
        Self {
            idempotency: IdempotencyGuard::new(std::time::Duration::from_secs(config.idempotency_window_s)),
            rate_limiter: HookRateLimiter::new(config.rate_limit_per_min),
            max_depth: config.max_depth,
            max_breadth: config.max_breadth,
        }
    }

    /// Fire `hook_id` within `cascade`, persisting the resulting event
    /// through `storage`. Idempotent replays skip persistence and return the
    /// original event id (spec §4.4 step 1; §8 "hook fires" invariant).
    pub async fn fire(
        &self,
        storage: &dyn StorageBackend,
        cascade: &mut CascadeStack,
        hook_id: HookId,
        args: HookArgs,
    ) -> Result<Uuid> {
        let fp = idempotency::fingerprint(hook_id, &args);
        if let Some(cached) = self.idempotency.check(&fp) {
            return Ok(cached);
        }

        if !self.rate_limiter.check(hook_id) {
            return Err(Error::RateLimited(format!("hook:{}", hook_id.as_str())));
        }

        cascade.try_push(hook_id).map_err(|reason| {
            Error::CascadeViolation(format!("{} on hook {}", reason.as_str(), hook_id.as_str()))
        })?;

        let now = Utc::now();
        let mut event = Event::new(
            args.project_id.clone(),
            args.session_id.clone(),
            event_type_for(hook_id),
            args.content.clone(),
            outcome_for(hook_id),
            args.context.clone(),
            now,
        );
        event.context.task.get_or_insert_with(|| hook_id.as_str().to_string());

        let result = storage.append_event(event).await;
        cascade.pop();

        let (event_id, _deduplicated) = result?;
        self.idempotency.record(fp, event_id);
        Ok(event_id)
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[must_use]
    pub fn max_breadth(&self) -> usize {
        self.max_breadth
    }
}
