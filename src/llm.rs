//! LLM provider abstraction
//!
//! Provides a common interface for the providers that back the scheme
//! explanation and eligibility oracles.

mod anthropic;
mod error;
mod gemini;
mod types;

pub use anthropic::{AnthropicModel, AnthropicService};
pub use error::{LlmError, LlmErrorKind};
pub use gemini::{GeminiModel, GeminiService};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Run a single-turn generation request
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Configuration for LLM providers
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    /// Model ID override (e.g. "gemini-pro", "claude-4.5-haiku")
    pub model: Option<String>,
    /// Base URL override, for proxies and tests
    pub base_url: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            model: std::env::var("MITRA_MODEL").ok(),
            base_url: std::env::var("MITRA_LLM_BASE_URL").ok(),
        }
    }

    /// Build the configured service, wrapped with logging.
    ///
    /// Provider preference follows the model override when given, otherwise
    /// Gemini (the service this assistant originally ran on), otherwise
    /// Anthropic. Returns `None` when no usable API key is configured.
    pub fn create_service(&self) -> Option<Arc<dyn LlmService>> {
        let base_url = self.base_url.as_deref();

        let inner: Arc<dyn LlmService> = match self.model.as_deref() {
            Some("gemini-pro") => Arc::new(GeminiService::new(
                self.gemini_api_key.clone()?,
                GeminiModel::Pro,
                base_url,
            )),
            Some("gemini-flash") => Arc::new(GeminiService::new(
                self.gemini_api_key.clone()?,
                GeminiModel::Flash,
                base_url,
            )),
            Some("claude-4.5-sonnet") => Arc::new(AnthropicService::new(
                self.anthropic_api_key.clone()?,
                AnthropicModel::Claude45Sonnet,
                base_url,
            )),
            Some("claude-4.5-haiku") => Arc::new(AnthropicService::new(
                self.anthropic_api_key.clone()?,
                AnthropicModel::Claude45Haiku,
                base_url,
            )),
            Some(other) => {
                tracing::warn!(model = %other, "Unknown model ID, ignoring override");
                return Self {
                    model: None,
                    ..self.clone()
                }
                .create_service();
            }
            None => {
                if let Some(key) = &self.gemini_api_key {
                    Arc::new(GeminiService::new(key.clone(), GeminiModel::Flash, base_url))
                } else if let Some(key) = &self.anthropic_api_key {
                    Arc::new(AnthropicService::new(
                        key.clone(),
                        AnthropicModel::Claude45Haiku,
                        base_url,
                    ))
                } else {
                    return None;
                }
            }
        };

        Some(Arc::new(LoggingService::new(inner)))
    }
}
