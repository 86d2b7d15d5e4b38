//! The engine's injected dependency bundle, passed explicitly to every
//! operation instead of resolved from globals/singletons (spec §9 redesign
//! flag "implicit globals/singletons").

use std::sync::Arc;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::embeddings::EmbeddingProvider;
use crate::llm::LlmClient;
use crate::storage::StorageBackend;

/// Everything an operation or pipeline stage needs to run, bundled so it can
/// be constructed once per process and threaded through explicitly.
#[derive(Clone)]
pub struct EngineContext {
    pub storage: Arc<dyn StorageBackend>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn LlmClient>,
    pub clock: Arc<dyn Clock>,
    pub config: EngineConfig,
}

impl EngineContext {
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            storage,
            embedder,
            llm,
            clock,
            config,
        }
    }
}
