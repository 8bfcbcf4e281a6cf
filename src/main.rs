//! CBT Companion - conversational support backend
//!
//! Serves a small HTTP API that forwards a user's message and recent history
//! to an OpenAI-compatible chat-completion endpoint and returns the reply
//! tagged with an emotion and a CBT technique.

mod annotator;
mod api;
mod config;
mod conversation;
mod llm;
mod prompt;

use api::{create_router, AppState};
use axum::http::{header, HeaderValue, Method};
use config::AppConfig;
use conversation::ConversationService;
use llm::{LlmService, LoggingService, OpenAIService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cbt_companion=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false),
        )
        .init();

    // Configuration is read once; restart to pick up changes
    let config = AppConfig::from_env();

    tracing::info!(
        api_key = %config.llm.masked_api_key(),
        model = %config.llm.model,
        base_url = %config.llm.base_url,
        timeout_secs = config.llm.timeout.as_secs(),
        "AI service configuration"
    );
    if !config.llm.has_api_key() {
        tracing::warn!(
            "No LLM API key configured. Set OPENAI_API_KEY or DEEPSEEK_API_KEY; calls will be rejected upstream."
        );
    }

    let client: Arc<dyn LlmService> = Arc::new(OpenAIService::new(&config.llm)?);
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(client));
    let state = AppState::new(ConversationService::new(llm), &config.environment);

    let cors = CorsLayer::new()
        .allow_origin(config.cors_origin.parse::<HeaderValue>()?)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        %addr,
        environment = %config.environment,
        model = %config.llm.model,
        "CBT companion server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
