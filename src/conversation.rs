//! Conversation orchestration
//!
//! `generate` runs prompt building, one completion call and annotation, in
//! that order. Upstream failures are logged in full by the provider's
//! logging wrapper and reported to callers as a single
//! [`ChatError::ServiceUnavailable`].

mod turn;

pub use turn::{GeneratedReply, Role, Turn};

use crate::annotator;
use crate::llm::{LlmRequest, LlmService};
use crate::prompt;
use std::sync::Arc;
use thiserror::Error;

/// Message shown to end users whenever the model cannot be reached
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "AI 服务暂时不可用，请稍后重试";

/// The only failure callers of [`ConversationService::generate`] can observe
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("{}", SERVICE_UNAVAILABLE_MESSAGE)]
    ServiceUnavailable,
}

/// Entry point of the reply pipeline. Holds no mutable state, so one
/// instance is shared by all requests.
pub struct ConversationService {
    llm: Arc<dyn LlmService>,
    system_prompt: String,
}

impl ConversationService {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self {
            llm,
            system_prompt: prompt::SYSTEM_PROMPT.to_string(),
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Produce a reply to `user_message` given the prior `history`.
    ///
    /// `history` must not already contain `user_message`; it is appended
    /// here as the final turn.
    pub async fn generate(
        &self,
        user_message: &str,
        history: &[Turn],
    ) -> Result<GeneratedReply, ChatError> {
        let messages = prompt::build_messages(&self.system_prompt, history, user_message);
        tracing::debug!(
            history_len = history.len(),
            sent_messages = messages.len(),
            "Built completion prompt"
        );

        let request = LlmRequest::new(messages);
        let response = self.llm.complete(&request).await.map_err(|e| {
            tracing::warn!(
                category = e.kind.category().as_str(),
                "Reply generation failed; returning service unavailable"
            );
            ChatError::ServiceUnavailable
        })?;

        let annotation = annotator::annotate(user_message, &response.text);
        tracing::info!(
            emotion = %annotation.emotion,
            technique = %annotation.technique,
            reply_chars = response.text.chars().count(),
            "Generated reply"
        );

        Ok(GeneratedReply {
            text: response.text,
            emotion: annotation.emotion,
            technique: annotation.technique,
        })
    }
}
