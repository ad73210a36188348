//! Sarkari Mitra - welfare scheme assistant
//!
//! A Rust backend implementing a conversation state machine for explaining
//! Indian government welfare schemes and running LLM-judged eligibility
//! interviews.

mod api;
mod flows;
mod llm;
mod runtime;
mod schemes;
mod session;
mod state_machine;

use api::{create_router, AppState};
use llm::LlmConfig;
use runtime::{LlmExplanationOracle, LlmVerdictOracle, RuntimeManager};
use session::SessionStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sarkari_mitra=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("MITRA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8600);

    // Initialize the LLM service backing both oracles
    let llm_config = LlmConfig::from_env();
    let llm_service = llm_config.create_service();

    match &llm_service {
        Some(service) => {
            tracing::info!(model = %service.model_id(), "LLM service initialized");
        }
        None => {
            tracing::warn!(
                "No LLM API keys configured. Set GEMINI_API_KEY or ANTHROPIC_API_KEY."
            );
        }
    }

    // Create application state
    let store = SessionStore::new();
    let manager = RuntimeManager::new(
        store,
        Arc::new(LlmExplanationOracle::new(llm_service.clone())),
        Arc::new(LlmVerdictOracle::new(llm_service)),
    );
    let state = AppState::new(Arc::new(manager));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(cors).layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Sarkari Mitra server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
