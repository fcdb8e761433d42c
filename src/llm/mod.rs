//! Model integration.
//!
//! A single `LlmProvider` trait with one implementation: the Gemini
//! `generateContent` endpoint over reqwest. The provider is created once
//! and reused for the life of the process.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::config::ModelConfig;
use crate::error::LlmError;

/// Text-in, text-out completion provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a plain-text prompt.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Create the provider from configuration.
pub fn create_provider(config: &ModelConfig) -> std::sync::Arc<dyn LlmProvider> {
    std::sync::Arc::new(GeminiClient::new(config.clone()))
}
