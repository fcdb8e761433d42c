//! Gemini `generateContent` client.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::LlmError;
use crate::llm::LlmProvider;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini client with key rotation.
///
/// Holds one `reqwest::Client` for the process lifetime. When the active
/// key is rejected (401/403) or throttled (429), the next configured key
/// is tried once before the error surfaces.
pub struct GeminiClient {
    http: reqwest::Client,
    config: ModelConfig,
    /// Index of the key currently in use.
    active_key: AtomicUsize,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            active_key: AtomicUsize::new(0),
            base_url: API_BASE.to_string(),
        }
    }

    /// Override the endpoint base URL (tests).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate_with_key(&self, key_index: usize, prompt: &str) -> Result<String, LlmError> {
        let key = &self.config.api_keys[key_index];
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url,
            self.config.model,
            key.expose_secret()
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                model: self.config.model.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                model: self.config.model.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                model: self.config.model.clone(),
                reason: e.to_string(),
            })?;

        parsed
            .first_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LlmError::InvalidResponse {
                model: self.config.model.clone(),
                reason: "response carried no text candidate".into(),
            })
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let key_count = self.config.api_keys.len();
        if key_count == 0 {
            return Err(LlmError::KeysExhausted {
                model: self.config.model.clone(),
            });
        }
        let start = self.active_key.load(Ordering::Relaxed) % key_count;
        let mut last_err = LlmError::KeysExhausted {
            model: self.config.model.clone(),
        };

        for offset in 0..key_count {
            let index = (start + offset) % key_count;
            match self.generate_with_key(index, prompt).await {
                Ok(text) => {
                    self.active_key.store(index, Ordering::Relaxed);
                    return Ok(text);
                }
                Err(e) if is_key_error(&e) => {
                    tracing::warn!(
                        key = index,
                        error = %e,
                        "API key rejected or throttled, rotating"
                    );
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Whether an error warrants trying the next configured key:
/// rejected (401/403) or throttled (429).
fn is_key_error(err: &LlmError) -> bool {
    matches!(err, LlmError::Http { status, .. } if matches!(status, 401 | 403 | 429))
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.as_str())
            .next()
    }
}
