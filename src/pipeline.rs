//! Pipeline facade: load → chunk → embed → index once at startup, then
//! retrieve → generate per question. This is the only operation the
//! transport layer calls.

use std::sync::Arc;

use crate::chunker;
use crate::config::Settings;
use crate::errors::{PipelineError, ProviderError};
use crate::generator::Generator;
use crate::index::VectorIndex;
use crate::llm::{call_with_retry, LlmProvider};
use crate::loader::DocumentLoader;
use crate::retriever::Retriever;

pub struct Pipeline {
    index: VectorIndex,
    retriever: Retriever,
    generator: Generator,
    provider: Arc<dyn LlmProvider>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Builds the whole pipeline, failing on the first unrecoverable error.
    /// Configuration is validated before anything touches the network;
    /// there is no partially constructed pipeline.
    pub async fn construct(
        settings: &Settings,
        provider: Arc<dyn LlmProvider>,
    ) -> Result<Self, PipelineError> {
        settings.validate()?;

        let loader = DocumentLoader::new(settings)?;
        let documents = loader.load(&settings.rag.document_sources).await?;

        let chunks = chunker::split_documents(
            &documents,
            settings.rag.chunk_size,
            settings.rag.chunk_overlap,
        );
        if chunks.is_empty() {
            return Err(PipelineError::Fetch {
                url: settings
                    .rag
                    .document_sources
                    .first()
                    .cloned()
                    .unwrap_or_default(),
                reason: "loaded documents produced no chunks".to_string(),
            });
        }
        tracing::info!(
            "chunked {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        let timeout = settings.request_timeout();
        let retry = settings.retry_policy();

        let mut index = VectorIndex::new();
        for batch in chunks.chunks(settings.rag.embed_batch_size) {
            let inputs: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let embeddings = call_with_retry(&retry, timeout, "chunk embedding", || {
                let provider = provider.clone();
                let inputs = inputs.clone();
                let model = settings.llm.embedding_model.clone();
                async move { provider.embed(&inputs, &model).await }
            })
            .await
            .map_err(PipelineError::Embedding)?;

            if embeddings.len() != batch.len() {
                return Err(PipelineError::Embedding(ProviderError::InvalidResponse(
                    format!("expected {} embeddings, got {}", batch.len(), embeddings.len()),
                )));
            }

            index.insert_batch(batch.iter().cloned().zip(embeddings).collect())?;
        }
        tracing::info!("indexed {} chunks", index.len());

        let retriever = Retriever::new(
            settings.rag.retrieval_k,
            settings.llm.embedding_model.clone(),
            timeout,
            retry.clone(),
        );
        let generator = Generator::new(settings.llm.model_name.clone(), timeout, retry);

        Ok(Self {
            index,
            retriever,
            generator,
            provider,
        })
    }

    /// Answers one question from the indexed corpus. Takes `&self` only;
    /// concurrent calls share the read-only index and nothing else.
    pub async fn ask(&self, question: &str) -> Result<String, PipelineError> {
        let context = self
            .retriever
            .retrieve(&self.index, &self.provider, question)
            .await?;
        self.generator
            .generate(&self.provider, question, &context)
            .await
    }

    /// Number of chunks in the index.
    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }
}
