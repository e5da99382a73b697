//! Prompt assembly and answer generation.

use std::sync::Arc;
use std::time::Duration;

use crate::chunker::Chunk;
use crate::errors::{PipelineError, ProviderError};
use crate::llm::{call_with_retry, ChatMessage, ChatRequest, LlmProvider, RetryPolicy};

/// Instruction template filled with the retrieved context and the question.
/// The model is told to answer from the supplied context only.
const ANSWER_TEMPLATE: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.\n\
Question: {question}\n\
Context: {context}\n\
Answer:";

pub struct Generator {
    model: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Generator {
    pub fn new(model: String, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            model,
            timeout,
            retry,
        }
    }

    /// The full prompt: chunk texts joined by blank lines, in retrieval
    /// order, substituted into the instruction template.
    pub fn build_prompt(question: &str, context_chunks: &[Chunk]) -> String {
        let context = context_chunks
            .iter()
            .map(|chunk| chunk.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        ANSWER_TEMPLATE
            .replace("{question}", question.trim())
            .replace("{context}", &context)
    }

    /// One grounded completion for the question. Transient provider
    /// failures are retried; a whitespace-only completion is an error.
    pub async fn generate(
        &self,
        provider: &Arc<dyn LlmProvider>,
        question: &str,
        context_chunks: &[Chunk],
    ) -> Result<String, PipelineError> {
        let prompt = Self::build_prompt(question, context_chunks);
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);

        let completion = call_with_retry(&self.retry, self.timeout, "chat completion", || {
            let provider = provider.clone();
            let request = request.clone();
            let model = self.model.clone();
            async move { provider.chat(request, &model).await }
        })
        .await
        .map_err(PipelineError::Generation)?;

        let answer = completion.trim();
        if answer.is_empty() {
            return Err(PipelineError::Generation(ProviderError::EmptyCompletion));
        }

        Ok(answer.to_string())
    }
}
