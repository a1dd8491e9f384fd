mod config;
mod documents;
mod errors;
mod llm_client;
mod render;
mod review;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::documents::service::DocumentService;
use crate::documents::DocumentType;
use crate::llm_client::LlmClient;
use crate::review::LlmReviewer;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Letterdesk API v{}", env!("CARGO_PKG_VERSION"));

    // Output directory must exist before the first render
    tokio::fs::create_dir_all(&config.generated_dir)
        .await
        .with_context(|| format!("Could not create output directory '{}'", config.generated_dir))?;

    // Missing templates are reported per request; flag them early too
    for document_type in DocumentType::ALL {
        let path = std::path::Path::new(&config.templates_dir).join(document_type.template_file());
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            warn!("Template for {} is missing: {}", document_type.label(), path.display());
        }
    }

    // Initialize LLM client and reviewer
    let llm = LlmClient::new(config.openai_api_key.clone(), &config.openai_base_url);
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let reviewer = Arc::new(LlmReviewer::new(llm));

    let documents = DocumentService::new(&config.templates_dir, &config.generated_dir, reviewer)
        .with_run_merging(config.merge_adjacent_runs);
    info!(
        "Templates: {}, output: {}, run merging: {}",
        config.templates_dir, config.generated_dir, config.merge_adjacent_runs
    );

    let state = AppState { documents };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
