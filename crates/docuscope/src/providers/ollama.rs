//! Ollama HTTP client and the embedding/LLM providers built on it

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

/// Check whether `model` appears in an Ollama model list. An untagged name
/// matches its `:latest` tag.
pub fn model_in_list(model: &str, installed: &[String]) -> bool {
    installed
        .iter()
        .any(|name| name == model || *name == format!("{}:latest", model))
}

/// Delay before retry number `attempt + 1`: 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

/// Ollama API client with automatic retry
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Server base URL without trailing slash
    base_url: String,
    /// Maximum retries
    max_retries: u32,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    /// Server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Retry an operation with exponential backoff, returning the last error
    async fn retry_request<F, Fut, T>(&self, operation: F) -> std::result::Result<T, String>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, String>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        "Ollama request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// POST a JSON body and decode the JSON reply
    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> std::result::Result<Resp, String>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {}", url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{} returned HTTP {}: {}", url, status, body.trim()));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| format!("failed to parse response from {}: {}", url, e))
    }

    /// List installed model names
    pub async fn list_models(&self) -> std::result::Result<Vec<String>, String> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("cannot reach Ollama at {}: {}", self.base_url, e))?;

        if !response.status().is_success() {
            return Err(format!("{} returned HTTP {}", url, response.status()));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse model list: {}", e))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Check that Ollama answers and `model` is installed
    pub async fn health_check(&self, model: &str) -> Result<bool> {
        match self.list_models().await {
            Ok(installed) if model_in_list(model, &installed) => Ok(true),
            Ok(installed) => {
                tracing::warn!(
                    "Model {} is not installed (available: {})",
                    model,
                    installed.join(", ")
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let request = &EmbedRequest { model, prompt: text };

        self.retry_request(move || async move {
            let response: EmbedResponse = self.post_json("/api/embeddings", request).await?;
            if response.embedding.is_empty() {
                return Err(format!("model {} returned an empty embedding", model));
            }
            Ok(response.embedding)
        })
        .await
        .map_err(Error::embedding)
    }

    /// Complete a prompt with retry
    pub async fn generate(&self, model: &str, prompt: &str, temperature: f32) -> Result<String> {
        let request = &GenerateRequest {
            model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature },
        };

        self.retry_request(move || async move {
            let response: GenerateResponse = self.post_json("/api/generate", request).await?;
            Ok(response.response)
        })
        .await
        .map_err(Error::generation)
    }
}

/// Ollama embedding provider (mxbai-embed-large by default)
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
    model: String,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder
    pub fn new(config: &LlmConfig, embeddings: &EmbeddingConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OllamaClient::new(config)?),
            embeddings.dimensions,
            config.embed_model.clone(),
        ))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, dimensions: usize, model: String) -> Self {
        Self {
            client,
            dimensions,
            model,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.client.embed(&self.model, text).await?;
        if embedding.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check(&self.model).await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Ollama LLM provider for answer generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
}

impl OllamaLlm {
    /// Create a new Ollama LLM provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OllamaClient::new(config)?),
            config.generate_model.clone(),
            config.temperature,
        ))
    }

    /// Create from existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: String, temperature: f32) -> Self {
        Self {
            client,
            model,
            temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!("Generating answer with model: {}", self.model);
        self.client.generate(&self.model, prompt, self.temperature).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check(&self.model).await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Build both Ollama providers on one shared HTTP client
pub fn ollama_providers(
    config: &LlmConfig,
    embeddings: &EmbeddingConfig,
) -> Result<(Arc<OllamaEmbedder>, Arc<OllamaLlm>)> {
    let client = Arc::new(OllamaClient::new(config)?);
    let embedder = OllamaEmbedder::from_client(
        Arc::clone(&client),
        embeddings.dimensions,
        config.embed_model.clone(),
    );
    let llm = OllamaLlm::from_client(client, config.generate_model.clone(), config.temperature);
    Ok((Arc::new(embedder), Arc::new(llm)))
}
