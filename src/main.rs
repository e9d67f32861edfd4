//! Main module for the triplerag service binary.
//!
//! Wires the pieces together: loads configuration from the environment,
//! loads the sentence embedding model, performs the startup index build from
//! the fact source, and serves the HTTP boundary until shutdown.
//!
//! # Examples
//!
//! Running against a local Fuseki dataset:
//!
//! ```sh
//! FUSEKI_URL=http://localhost:3030/vn cargo run
//! curl -s -X POST localhost:8080/ask \
//!     -H 'content-type: application/json' \
//!     -d '{"question": "which provinces were merged?"}'
//! ```

use std::error::Error;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{info, warn};

use triplerag::config::RagConfig;
use triplerag::embedding::MiniLmEmbedder;
use triplerag::engine::RetrievalEngine;
use triplerag::ingest::fetch_documents;
use triplerag::server::{AppState, build_router};

static TRACING: OnceCell<()> = OnceCell::new();

fn main() -> Result<(), Box<dyn Error>> {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt::init();
    });
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run())
}

/// Start the service: build the index once, then serve requests.
///
/// A failed startup build is logged and the service comes up anyway — every
/// `/ask` then answers with empty context until a `POST /rebuild` succeeds.
/// A missing embedding model, by contrast, is fatal: without it no question
/// can ever be embedded.
async fn run() -> Result<(), Box<dyn Error>> {
    let config = RagConfig::from_env();
    info!("Fact source at {}", config.fuseki_url);

    let embedder = MiniLmEmbedder::load()?;
    let engine = RetrievalEngine::new(Arc::new(embedder));
    let http = reqwest::Client::new();

    match fetch_documents(&http, &config.query_url()).await {
        Ok(documents) => match engine.install(documents) {
            Ok(indexed) => info!("Startup build complete: {indexed} documents indexed"),
            Err(err) => warn!("Startup build failed, serving with empty context: {err}"),
        },
        Err(err) => {
            warn!("Startup build failed, serving with empty context: {err}");
        }
    }

    let state = Arc::new(AppState {
        engine,
        http,
        config: config.clone(),
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM so in-flight requests can drain.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
