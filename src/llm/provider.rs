use async_trait::async_trait;

use super::types::ChatRequest;
use crate::errors::ProviderError;

/// The external model capability the pipeline depends on: one provider
/// serves both chat completions and embeddings.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openai")
    fn name(&self) -> &str;

    /// check if the provider is reachable
    async fn health_check(&self) -> Result<bool, ProviderError>;

    /// chat completion (non-streaming); returns the completion text
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ProviderError>;

    /// embeddings for a batch of inputs, one vector per input, same order
    async fn embed(&self, inputs: &[String], model_id: &str)
        -> Result<Vec<Vec<f32>>, ProviderError>;
}
