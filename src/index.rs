//! In-memory vector index: brute-force cosine similarity over chunk
//! embeddings. Built once at pipeline construction, read-only afterwards.

use std::cmp::Ordering;

use crate::chunker::Chunk;
use crate::errors::{PipelineError, ProviderError};

#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// A chunk scored against a query embedding.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension of the stored embeddings, once the first entry exists.
    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|entry| entry.embedding.len())
    }

    /// Append chunk/embedding pairs. Every embedding must be non-empty and
    /// match the index dimension; a malformed vector fails the whole batch,
    /// since a corrupted index is worse than a failed build.
    pub fn insert_batch(&mut self, pairs: Vec<(Chunk, Vec<f32>)>) -> Result<(), PipelineError> {
        for (chunk, embedding) in pairs {
            if embedding.is_empty() {
                return Err(PipelineError::Embedding(ProviderError::InvalidResponse(
                    format!("empty embedding for chunk {} of {}", chunk.ordinal, chunk.source),
                )));
            }
            if let Some(dim) = self.dimension() {
                if embedding.len() != dim {
                    return Err(PipelineError::Embedding(ProviderError::InvalidResponse(
                        format!(
                            "embedding dimension {} does not match index dimension {}",
                            embedding.len(),
                            dim
                        ),
                    )));
                }
            }
            self.entries.push(IndexEntry { chunk, embedding });
        }
        Ok(())
    }

    /// Top-k entries by cosine similarity, best first. The sort is stable,
    /// so equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(query, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}
