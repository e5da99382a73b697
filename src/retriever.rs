//! Retrieval seam: embeds the question and queries the index. Kept
//! separate from the index so retrieval policy can evolve on its own.

use std::sync::Arc;
use std::time::Duration;

use crate::chunker::Chunk;
use crate::errors::{PipelineError, ProviderError};
use crate::index::VectorIndex;
use crate::llm::{call_with_retry, LlmProvider, RetryPolicy};

pub const DEFAULT_K: usize = 4;

pub struct Retriever {
    k: usize,
    embedding_model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Retriever {
    pub fn new(k: usize, embedding_model: String, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            k,
            embedding_model,
            timeout,
            retry,
        }
    }

    /// Top-k chunks for the question, best first; at most `k` results.
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        provider: &Arc<dyn LlmProvider>,
        question: &str,
    ) -> Result<Vec<Chunk>, PipelineError> {
        let inputs = vec![question.to_string()];
        let mut vectors = call_with_retry(&self.retry, self.timeout, "question embedding", || {
            let provider = provider.clone();
            let inputs = inputs.clone();
            let model = self.embedding_model.clone();
            async move { provider.embed(&inputs, &model).await }
        })
        .await
        .map_err(PipelineError::Embedding)?;

        let query = vectors
            .pop()
            .filter(|vector| !vector.is_empty())
            .ok_or_else(|| {
                PipelineError::Embedding(ProviderError::InvalidResponse(
                    "no embedding returned for the question".to_string(),
                ))
            })?;

        let hits = index.search(&query, self.k);
        for hit in &hits {
            tracing::debug!(
                "retrieved {}#{} (score {:.3})",
                hit.chunk.source,
                hit.chunk.ordinal,
                hit.score
            );
        }

        Ok(hits.into_iter().map(|hit| hit.chunk).collect())
    }
}
