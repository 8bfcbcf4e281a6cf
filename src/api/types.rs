//! API request and response types

use crate::annotator::{Emotion, Technique};
use crate::conversation::{Role, Turn};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Absent and `null` are treated like a blank message
    #[serde(default)]
    pub message: Option<String>,
    /// Prior turns, oldest first, excluding `message`
    #[serde(default)]
    pub history: Vec<Turn>,
}

/// Assistant turn as returned to the client
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub emotion: Emotion,
    pub cbt_technique: Technique,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageData {
    pub message: AssistantMessage,
    /// Always true while there are no accounts
    pub is_guest: bool,
}

/// Response for a chat message
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub data: SendMessageData,
}

/// Response for the health probe
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub environment: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
