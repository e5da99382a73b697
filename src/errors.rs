use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Failure of a single call to the embedding/completion provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider returned status {code}: {message}")]
    Status { code: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("call timed out")]
    Timeout,
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),
    #[error("provider returned an empty completion")]
    EmptyCompletion,
}

impl ProviderError {
    /// Transient failures are retried with backoff; everything else fails
    /// the call immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Network(_) | ProviderError::Timeout => true,
            ProviderError::Status { code, .. } => *code == 408 || *code == 429 || *code >= 500,
            ProviderError::InvalidResponse(_) | ProviderError::EmptyCompletion => false,
        }
    }

    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Pipeline error taxonomy. Construction-time errors are fatal; query-time
/// errors surface through `Pipeline::ask` and are mapped to responses at
/// the server boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to load {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("embedding failed: {0}")]
    Embedding(ProviderError),
    #[error("generation failed: {0}")]
    Generation(ProviderError),
}

/// HTTP-facing error, converted into a JSON error response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("upstream failure: {0}")]
    BadGateway(String),
    #[error("upstream timeout: {0}")]
    GatewayTimeout(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match &err {
            PipelineError::Config(msg) => ApiError::BadRequest(msg.clone()),
            PipelineError::Fetch { .. } => ApiError::BadGateway(err.to_string()),
            PipelineError::Embedding(cause) | PipelineError::Generation(cause) => {
                if matches!(cause, ProviderError::Timeout) {
                    ApiError::GatewayTimeout(err.to_string())
                } else {
                    ApiError::BadGateway(err.to_string())
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
