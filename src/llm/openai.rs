//! `OpenAI`-compatible chat-completions client

use super::config::LlmConfig;
use super::types::{ChatMessage, LlmRequest, LlmResponse, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for any provider speaking the `/chat/completions` dialect
/// (`OpenAI`, `DeepSeek`, relays such as chatanywhere).
///
/// Every call is a single attempt bounded by the configured timeout.
pub struct OpenAIService {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAIService {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            url: config.completions_url(),
        })
    }

    fn translate_request<'a>(&'a self, request: &'a LlmRequest) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.params.max_tokens,
            temperature: request.params.temperature,
            presence_penalty: request.params.presence_penalty,
            frequency_penalty: request.params.frequency_penalty,
        }
    }

    fn classify_status(&self, status: reqwest::StatusCode, body: &str) -> LlmError {
        // Prefer the provider's own message when the body is a proper error envelope
        let message = serde_json::from_str::<OpenAIErrorResponse>(body)
            .map_or_else(|_| body.to_string(), |resp| resp.error.message);

        let code = status.as_u16();
        let err = match code {
            401 | 403 if self.api_key.is_empty() => {
                LlmError::config(format!("API key not configured: {message}"))
            }
            401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
            429 => LlmError::rate_limit(format!("Rate limit exceeded: {message}")),
            400 => LlmError::invalid_request(format!("Invalid request: {message}")),
            500..=599 => LlmError::server_error(format!("Server error: {message}")),
            _ => LlmError::unknown(format!("HTTP {status}: {message}")),
        };
        err.with_status(code)
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::malformed("No choices in response"))?;

        let text = choice
            .message
            .and_then(|m| m.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| LlmError::malformed("First choice has no message content"))?;

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(LlmResponse {
            text,
            finish_reason: choice.finish_reason,
            usage,
        })
    }
}

fn transport_error(e: &reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::timeout(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        LlmError::network(format!("Connection failed: {e}"))
    } else {
        LlmError::network(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let openai_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::timeout(format!("Timed out reading response: {e}"))
            } else {
                LlmError::network(format!("Failed to read response: {e}"))
            }
        })?;

        if !status.is_success() {
            return Err(self.classify_status(status, &body));
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::malformed(format!("Failed to parse response: {e} - body: {body}"))
                .with_status(status.as_u16())
        })?;

        Self::normalize_response(openai_response).map_err(|e| e.with_status(status.as_u16()))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    #[serde(default)]
    message: Option<OpenAIMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;
    use crate::llm::error::FailureCategory;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct Captured {
        calls: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config_for(base_url: String) -> LlmConfig {
        LlmConfig {
            api_key: "sk-test".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url,
            timeout: Duration::from_secs(5),
        }
    }

    fn request() -> LlmRequest {
        LlmRequest::new(vec![
            ChatMessage::system("be kind"),
            ChatMessage::user("我最近很焦虑"),
        ])
    }

    async fn ok_handler(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        captured.calls.lock().unwrap().push((auth, body));
        Json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "试着做几次深呼吸。"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 42, "completion_tokens": 7, "total_tokens": 49}
        }))
    }

    #[tokio::test]
    async fn test_success_sends_expected_body() {
        let captured = Captured::default();
        let router = Router::new()
            .route("/v1/chat/completions", post(ok_handler))
            .with_state(captured.clone());
        let base = serve(router).await;

        let service = OpenAIService::new(&config_for(format!("{base}/v1/"))).unwrap();
        let response = service.complete(&request()).await.unwrap();

        assert_eq!(response.text, "试着做几次深呼吸。");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.input_tokens, 42);
        assert_eq!(response.usage.output_tokens, 7);

        let calls = captured.calls.lock().unwrap();
        assert_eq!(calls.len(), 1, "exactly one attempt");
        let (auth, body) = &calls[0];
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert!((body["presence_penalty"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert!((body["frequency_penalty"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "我最近很焦虑");
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let captured = Captured::default();
        let router = Router::new()
            .route(
                "/chat/completions",
                post(|State(c): State<Captured>| async move {
                    c.calls.lock().unwrap().push((None, Value::Null));
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"error": {"message": "Incorrect API key", "type": "invalid_request_error"}})),
                    )
                }),
            )
            .with_state(captured.clone());
        let base = serve(router).await;

        let service = OpenAIService::new(&config_for(base)).unwrap();
        let err = service.complete(&request()).await.unwrap_err();

        assert_eq!(err.kind, LlmErrorKind::Auth);
        assert_eq!(err.status, Some(401));
        assert!(err.message.contains("Incorrect API key"));
        assert_eq!(captured.calls.lock().unwrap().len(), 1, "no retry");
    }

    #[tokio::test]
    async fn test_unauthorized_without_key_is_config_error() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "no key").into_response() }),
        );
        let base = serve(router).await;

        let mut config = config_for(base);
        config.api_key = String::new();
        let service = OpenAIService::new(&config).unwrap();
        let err = service.complete(&request()).await.unwrap_err();

        assert_eq!(err.kind, LlmErrorKind::Config);
        assert_eq!(err.status, Some(401));
    }

    #[tokio::test]
    async fn test_server_error_and_rate_limit() {
        let router = Router::new()
            .route(
                "/a/chat/completions",
                post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
            )
            .route(
                "/b/chat/completions",
                post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            );
        let base = serve(router).await;

        let a = OpenAIService::new(&config_for(format!("{base}/a"))).unwrap();
        let err = a.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::RateLimit);

        let b = OpenAIService::new(&config_for(format!("{base}/b"))).unwrap();
        let err = b.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::ServerError);
        assert!(err.message.contains("upstream down"));
    }

    #[tokio::test]
    async fn test_unhandled_status_is_upstream_rejection() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async { (StatusCode::NOT_FOUND, "no such route") }),
        );
        let base = serve(router).await;

        let service = OpenAIService::new(&config_for(base)).unwrap();
        let err = service.complete(&request()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Unknown);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.kind.category(), FailureCategory::UpstreamRejection);
    }

    #[tokio::test]
    async fn test_malformed_bodies() {
        let router = Router::new()
            .route(
                "/empty/chat/completions",
                post(|| async { Json(json!({"choices": []})) }),
            )
            .route(
                "/null/chat/completions",
                post(|| async {
                    Json(json!({"choices": [{"message": {"role": "assistant", "content": null}}]}))
                }),
            )
            .route(
                "/blank/chat/completions",
                post(|| async {
                    Json(json!({"choices": [{"message": {"role": "assistant", "content": ""}}]}))
                }),
            )
            .route(
                "/garbage/chat/completions",
                post(|| async { "<html>gateway</html>" }),
            );
        let base = serve(router).await;

        for path in ["empty", "null", "blank", "garbage"] {
            let service = OpenAIService::new(&config_for(format!("{base}/{path}"))).unwrap();
            let err = service.complete(&request()).await.unwrap_err();
            assert_eq!(err.kind, LlmErrorKind::Malformed, "case {path}");
            assert_eq!(err.status, Some(200), "case {path}");
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"choices": []}))
            }),
        );
        let base = serve(router).await;

        let mut config = config_for(base);
        config.timeout = Duration::from_millis(100);
        let service = OpenAIService::new(&config).unwrap();
        let err = service.complete(&request()).await.unwrap_err();

        assert_eq!(err.kind, LlmErrorKind::Timeout);
        assert_eq!(err.status, None);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Reserve a port, then free it so nothing is listening there
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service = OpenAIService::new(&config_for(format!("http://{addr}"))).unwrap();
        let err = service.complete(&request()).await.unwrap_err();

        assert_eq!(err.kind, LlmErrorKind::Network);
        assert_eq!(err.status, None);
    }
}
