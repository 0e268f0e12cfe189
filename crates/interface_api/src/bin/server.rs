//! Claims Decision API Server Binary
//!
//! Loads the claim tables once, wires the reasoning and retrieval adapters,
//! and serves the workflow over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration (lexical policy index, ./data)
//! GOOGLE_API_KEY=... cargo run --bin claims-api
//!
//! # Pinecone-backed policy evidence, filling the index on start
//! CLAIMS_RETRIEVAL_BACKEND=pinecone CLAIMS_PINECONE_INDEX_HOST=... \
//!   CLAIMS_PINECONE_INGEST_ON_START=true cargo run --bin claims-api
//! ```
//!
//! # Environment Variables
//!
//! * `CLAIMS_HOST` / `CLAIMS_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `CLAIMS_DATA_DIR` - Directory with the CSV tables (default: data)
//! * `CLAIMS_POLICY_DOCS_DIR` - Policy documents (default: data/policyDocs)
//! * `CLAIMS_GEMINI_API_KEY` or `GOOGLE_API_KEY` - Reasoning service key (required)
//! * `CLAIMS_RETRIEVAL_BACKEND` - `lexical` or `pinecone`
//! * `CLAIMS_TERMINATION_MODE` - `halt_on_disqualification` or `last_writer_wins`
//! * `CLAIMS_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::HealthCheckable;
use domain_claims::{ClaimWorkflow, RetrievalPort};
use infra_data::{load_policy_docs, load_snapshot, LexicalPolicyIndex, TextSplitter};
use infra_external::{GeminiReasoningAdapter, OpenAiEmbeddings, PassageRecord, PineconeRetrievalAdapter};
use interface_api::config::{ApiConfig, RetrievalBackend};
use interface_api::{create_router, AppState};

/// Main entry point for the API server.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded from environment
/// - The CSV tables or policy documents cannot be read
/// - An adapter is missing its API key
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("Failed to load configuration")?;
    config.validate()?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        backend = ?config.retrieval_backend,
        termination = ?config.termination_mode,
        "Starting Claims Decision API Server"
    );

    let snapshot = Arc::new(
        load_snapshot(&config.data_dir)
            .with_context(|| format!("Failed to load claim tables from {}", config.data_dir))?,
    );

    let decisions = Arc::new(GeminiReasoningAdapter::new(config.gemini(config.eligibility_temperature))?);
    let explanations = Arc::new(GeminiReasoningAdapter::new(config.gemini(config.explanation_temperature))?);
    let (retrieval, retrieval_health) = build_retrieval(&config).await?;

    let workflow = ClaimWorkflow::new(snapshot.clone(), decisions.clone(), retrieval, config.workflow_config())
        .with_explainer_reasoning(explanations);

    let snapshot_health: Arc<dyn HealthCheckable> = snapshot;
    let reasoning_health: Arc<dyn HealthCheckable> = decisions;
    let health_checks = vec![snapshot_health, reasoning_health, retrieval_health];
    let addr: SocketAddr = config.server_addr().parse()?;
    let app = create_router(AppState::new(workflow, health_checks, config));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Builds the configured retrieval backend and its health check
async fn build_retrieval(config: &ApiConfig) -> Result<(Arc<dyn RetrievalPort>, Arc<dyn HealthCheckable>)> {
    match config.retrieval_backend {
        RetrievalBackend::Lexical => {
            let index = Arc::new(
                LexicalPolicyIndex::from_dir(&config.policy_docs_dir)
                    .with_context(|| format!("Failed to index policy docs in {}", config.policy_docs_dir))?,
            );
            let retrieval: Arc<dyn RetrievalPort> = index.clone();
            let health: Arc<dyn HealthCheckable> = index;
            Ok((retrieval, health))
        }
        RetrievalBackend::Pinecone => {
            let embeddings = OpenAiEmbeddings::new(config.openai())?;
            let adapter = Arc::new(PineconeRetrievalAdapter::new(config.pinecone(), embeddings)?);

            if config.pinecone_ingest_on_start {
                let chunks = load_policy_docs(&config.policy_docs_dir, &TextSplitter::default())
                    .with_context(|| format!("Failed to read policy docs in {}", config.policy_docs_dir))?;
                let passages: Vec<PassageRecord> = chunks
                    .into_iter()
                    .enumerate()
                    .map(|(i, chunk)| PassageRecord {
                        id: format!("{}-{}", chunk.source, i),
                        source: chunk.source,
                        text: chunk.text,
                    })
                    .collect();
                adapter
                    .ingest(&passages)
                    .await
                    .context("Failed to ingest policy docs into Pinecone")?;
            }

            let retrieval: Arc<dyn RetrievalPort> = adapter.clone();
            let health: Arc<dyn HealthCheckable> = adapter;
            Ok((retrieval, health))
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
