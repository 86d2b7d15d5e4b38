//! The embedding provider contract (spec §6 "External collaborators").
//!
//! Embedding-model hosting itself is out of scope (spec §1 Out of scope);
//! this module specifies only the trait boundary plus a deterministic mock
//! used by tests and by callers that have not wired a real provider.

use async_trait::async_trait;

use crate::error::{Error, Result};

/// `embed`/`embed_batch` contract for an external embedding model.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Dimensionality this provider returns; must match `storage.embedding_dim`.
    fn dimension(&self) -> usize;

    /// Embed a single piece of text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts; default implementation calls [`Self::embed`]
    /// sequentially, which concrete providers typically override with a
    /// real batched HTTP call.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// A deterministic embedding provider for tests: hashes the text into a
/// fixed-dimension vector so identical content always gets the same vector
/// and similar prefixes land near each other, without any external call.
#[derive(Debug, Clone, Copy)]
pub struct DeterministicEmbeddingProvider {
    dim: usize,
}

impl DeterministicEmbeddingProvider {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for DeterministicEmbeddingProvider {
    fn default() -> Self {
        Self::new(crate::types::DEFAULT_EMBEDDING_DIM)
    }
}

#[async_trait]
impl EmbeddingProvider for DeterministicEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(Error::InvalidArgument("cannot embed empty text".into()));
        }
        let mut vector = vec![0.0f32; self.dim];
        let tokens: Vec<&str> = text.split_whitespace().collect();
        for token in &tokens {
            let mut h: u64 = 1469598103934665603; // FNV offset basis
            for byte in token.bytes() {
                h ^= u64::from(byte);
                h = h.wrapping_mul(1099511628211); // FNV prime
            }
            let slot = (h as usize) % self.dim;
            let sign = if h & 1 == 0 { 1.0 } else { -1.0 };
            vector[slot] += sign;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_embeddings_are_stable() {
        let provider = DeterministicEmbeddingProvider::new(32);
        let a = provider.embed("hello world").await.unwrap();
        let b = provider.embed("hello world").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let provider = DeterministicEmbeddingProvider::default();
        assert!(provider.embed("").await.is_err());
    }

    #[tokio::test]
    async fn batch_matches_individual_calls() {
        let provider = DeterministicEmbeddingProvider::new(16);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();
        let a = provider.embed("alpha").await.unwrap();
        assert_eq!(batch[0], a);
    }
}
