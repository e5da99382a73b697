use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::llm::RetryPolicy;
use crate::retriever::DEFAULT_K;

const DEFAULT_CONFIG_PATH: &str = "lexora.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub rag: RagSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8710,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible endpoint root (the `/v1/...` paths are appended).
    pub base_url: String,
    /// Model used for answer generation.
    pub model_name: String,
    /// Model used for chunk and question embeddings.
    pub embedding_model: String,
    pub request_timeout_secs: u64,
    /// Attempts per provider call, transient failures only.
    pub max_attempts: u32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model_name: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            request_timeout_secs: 60,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks; must stay below
    /// `chunk_size`.
    pub chunk_overlap: usize,
    /// Chunks retrieved per question.
    pub retrieval_k: usize,
    /// Chunk texts sent to the embedding endpoint per request.
    pub embed_batch_size: usize,
    pub fetch_timeout_secs: u64,
    /// Ordered list of corpus URLs, fixed at startup.
    pub document_sources: Vec<String>,
    /// CSS class names selecting the content-bearing nodes of a page.
    pub content_markers: Vec<String>,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            retrieval_k: DEFAULT_K,
            embed_batch_size: 64,
            fetch_timeout_secs: 30,
            document_sources: Vec::new(),
            content_markers: vec![
                "post-content".to_string(),
                "post-title".to_string(),
                "post-header".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub dir: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
        }
    }
}

impl Settings {
    /// Load from the path in `LEXORA_CONFIG`, falling back to
    /// `lexora.toml` in the working directory.
    pub fn load() -> Result<Self, PipelineError> {
        let path = env::var("LEXORA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_path(Path::new(&path))
    }

    pub fn from_path(path: &Path) -> Result<Self, PipelineError> {
        let raw = fs::read_to_string(path).map_err(|err| {
            PipelineError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let settings: Settings = toml::from_str(&raw).map_err(|err| {
            PipelineError::Config(format!("cannot parse {}: {}", path.display(), err))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// The API key is never stored in the config file.
    pub fn api_key() -> String {
        env::var("OPENAI_API_KEY").unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.rag.chunk_size == 0 {
            return Err(PipelineError::Config(
                "rag.chunk_size must be positive".to_string(),
            ));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(PipelineError::Config(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.rag.retrieval_k == 0 {
            return Err(PipelineError::Config(
                "rag.retrieval_k must be positive".to_string(),
            ));
        }
        if self.rag.embed_batch_size == 0 {
            return Err(PipelineError::Config(
                "rag.embed_batch_size must be positive".to_string(),
            ));
        }
        if self
            .rag
            .document_sources
            .iter()
            .all(|source| source.trim().is_empty())
        {
            return Err(PipelineError::Config(
                "rag.document_sources must list at least one URL".to_string(),
            ));
        }
        if self.rag.content_markers.is_empty() {
            return Err(PipelineError::Config(
                "rag.content_markers must list at least one class name".to_string(),
            ));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(PipelineError::Config(
                "llm.base_url must not be empty".to_string(),
            ));
        }
        if self.llm.model_name.trim().is_empty() {
            return Err(PipelineError::Config(
                "llm.model_name must not be empty".to_string(),
            ));
        }
        if self.llm.embedding_model.trim().is_empty() {
            return Err(PipelineError::Config(
                "llm.embedding_model must not be empty".to_string(),
            ));
        }
        if self.llm.max_attempts == 0 {
            return Err(PipelineError::Config(
                "llm.max_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.request_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.rag.fetch_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.llm.max_attempts,
            ..RetryPolicy::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.rag.document_sources = vec!["https://example.com/post".to_string()];
        settings
    }

    #[test]
    fn defaults_pass_validation_once_sources_are_set() {
        valid_settings().validate().unwrap();
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let mut settings = valid_settings();
        settings.rag.chunk_overlap = settings.rag.chunk_size;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));

        settings.rag.chunk_overlap = settings.rag.chunk_size + 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn sources_are_required() {
        let mut settings = valid_settings();
        settings.rag.document_sources = Vec::new();
        assert!(matches!(
            settings.validate(),
            Err(PipelineError::Config(_))
        ));

        settings.rag.document_sources = vec!["   ".to_string()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexora.toml");
        fs::write(
            &path,
            r#"
[llm]
model_name = "gpt-4o"

[rag]
chunk_size = 800
document_sources = ["https://example.com/a", "https://example.com/b"]
"#,
        )
        .unwrap();

        let settings = Settings::from_path(&path).unwrap();
        assert_eq!(settings.llm.model_name, "gpt-4o");
        assert_eq!(settings.rag.chunk_size, 800);
        assert_eq!(settings.rag.chunk_overlap, 200);
        assert_eq!(settings.rag.retrieval_k, 4);
        assert_eq!(settings.rag.document_sources.len(), 2);
        assert_eq!(settings.rag.content_markers.len(), 3);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexora.toml");
        fs::write(&path, "rag = 12").unwrap();

        assert!(matches!(
            Settings::from_path(&path),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        assert!(matches!(
            Settings::from_path(Path::new("/nonexistent/lexora.toml")),
            Err(PipelineError::Config(_))
        ));
    }
}
