//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for LLM-based text generation
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a fully assembled prompt. Failures are reported as
    /// `Error::GenerationUnavailable`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is reachable and its model is available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
