use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::LlmProvider;
use super::types::ChatRequest;
use crate::errors::ProviderError;

/// Client for any OpenAI-compatible endpoint: `/v1/chat/completions` for
/// generation, `/v1/embeddings` for vectors.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ProviderError::Network(err.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .authorized(self.client.post(&url).json(body))
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?;

        let status = res.status();
        if !status.is_success() {
            let message = res.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                code: status.as_u16(),
                message,
            });
        }

        res.json().await.map_err(ProviderError::from_reqwest)
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/v1/models", self.base_url);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ProviderError> {
        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(t) = request.max_tokens {
                obj.insert("max_tokens".to_string(), json!(t));
            }
            if let Some(s) = &request.stop {
                obj.insert("stop".to_string(), json!(s));
            }
        }

        let payload = self.post_json("/v1/chat/completions", &body).await?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::InvalidResponse("missing choices[0].message.content".to_string())
            })?;

        Ok(content.to_string())
    }

    async fn embed(
        &self,
        inputs: &[String],
        model_id: &str,
    ) -> Result<Vec<Vec<f32>>, ProviderError> {
        let body = json!({
            "model": model_id,
            "input": inputs,
        });

        let payload = self.post_json("/v1/embeddings", &body).await?;

        let data = payload["data"]
            .as_array()
            .ok_or_else(|| ProviderError::InvalidResponse("missing data array".to_string()))?;

        let mut embeddings = Vec::with_capacity(data.len());
        for item in data {
            let values = item["embedding"].as_array().ok_or_else(|| {
                ProviderError::InvalidResponse("missing embedding values".to_string())
            })?;

            let vector: Vec<f32> = values
                .iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect();
            if vector.is_empty() || vector.len() != values.len() {
                return Err(ProviderError::InvalidResponse(
                    "non-numeric embedding values".to_string(),
                ));
            }

            embeddings.push(vector);
        }

        if embeddings.len() != inputs.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                embeddings.len()
            )));
        }

        Ok(embeddings)
    }
}
