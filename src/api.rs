//! HTTP API
//!
//! Stateless: clients send the prior turns with each message.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::conversation::ConversationService;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConversationService>,
    pub environment: Arc<str>,
}

impl AppState {
    pub fn new(conversation: ConversationService, environment: &str) -> Self {
        Self {
            conversation: Arc::new(conversation),
            environment: Arc::from(environment),
        }
    }
}
