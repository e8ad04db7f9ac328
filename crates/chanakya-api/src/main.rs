//! Chanakya API Server
//!
//! Loads `.env`, opens the vector index built by `chanakya ingest` and
//! serves the chat endpoint and frontend.
//!
//! Author: hephaex@gmail.com

use chanakya_api::{create_router, state::AppState};
use chanakya_core::{AppConfig, LoggingConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let index_file = config.server.static_dir.join("index.html");
    if !index_file.is_file() {
        tracing::warn!(path = %index_file.display(), "index.html not found, GET / will return 404");
    }

    // Create application state
    let state = Arc::new(AppState::from_config(config).await?);
    let indexed = state.store.count().await?;
    if indexed == 0 {
        tracing::warn!(
            index = %state.config.index.path.display(),
            "Vector index is empty, run `chanakya ingest` first"
        );
    }
    tracing::info!(
        llm = ?state.config.llm.provider,
        model = %state.config.llm.model,
        embedding = ?state.config.embedding.provider,
        indexed_chunks = indexed,
        "Pipeline ready"
    );

    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Chanakya API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{},tower_http=debug", config.level).into());

    if config.json_format {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
