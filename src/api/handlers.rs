//! HTTP request handlers

use super::types::{
    AssistantMessage, ErrorResponse, HealthResponse, SendMessageData, SendMessageRequest,
    SendMessageResponse,
};
use super::AppState;
use crate::conversation::{ChatError, Role};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::Instrument;

/// Largest accepted request body
const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat/send", post(send_message))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .with_state(state)
}

// ============================================================
// Health
// ============================================================

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "AI心理咨询服务运行正常".to_string(),
        timestamp: Utc::now(),
        environment: state.environment.to_string(),
    })
}

// ============================================================
// Chat
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<Json<SendMessageResponse>, AppError> {
    let Json(req) = payload?;
    let message = match req.message {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(AppError::BadRequest("消息内容不能为空".to_string())),
    };

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!(
        "chat_send",
        %request_id,
        model = state.conversation.model_id(),
        history_len = req.history.len()
    );

    let reply = state
        .conversation
        .generate(&message, &req.history)
        .instrument(span)
        .await?;

    Ok(Json(SendMessageResponse {
        success: true,
        data: SendMessageData {
            message: AssistantMessage {
                role: Role::Assistant,
                content: reply.text,
                timestamp: Utc::now(),
                emotion: reply.emotion,
                cbt_technique: reply.technique,
            },
            is_guest: true,
        },
    }))
}

// ============================================================
// Fallback
// ============================================================

async fn not_found() -> AppError {
    AppError::NotFound("请求的资源不存在".to_string())
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    InvalidBody(JsonRejection),
    Chat(ChatError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody(rejection)
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        AppError::Chat(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidBody(rejection) => {
                tracing::warn!(error = %rejection.body_text(), "Rejected request body");
                let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    StatusCode::BAD_REQUEST
                };
                (status, rejection.body_text())
            }
            AppError::Chat(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
