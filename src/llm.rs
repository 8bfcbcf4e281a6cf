//! Chat-completion provider abstraction
//!
//! The conversation layer talks to the provider only through [`LlmService`],
//! so tests can swap in a scripted implementation.

mod config;
mod error;
mod openai;
#[cfg(test)]
pub mod testing;
mod types;

pub use config::LlmConfig;
pub use error::{LlmError, LlmErrorKind};
pub use openai::OpenAIService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for completion providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make one completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for completion services
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
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    finish_reason = ?response.finish_reason,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    category = e.kind.category().as_str(),
                    kind = ?e.kind,
                    status = ?e.status,
                    error = %e.message,
                    "LLM request failed"
                );
                if e.kind == LlmErrorKind::Config {
                    tracing::error!(
                        "Provider rejected the call and no API key is set; configure OPENAI_API_KEY or DEEPSEEK_API_KEY"
                    );
                }
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
