//! Jarbas server binary
//!
//! Run with: cargo run -p jarbas-rag --bin jarbas-server

use clap::Parser;
use jarbas_rag::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Jarbas: ask questions about your PDFs
#[derive(Debug, Parser)]
#[command(name = "jarbas-server", version, about)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, env = "JARBAS_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jarbas_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing API key is fatal
    let config = RagConfig::load(cli.config.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.gemini.embedding_model);
    tracing::info!("  - Generation model: {}", config.gemini.generation_model);
    tracing::info!(
        "  - Collection: {} ({}, {} dimensions)",
        config.vector_db.collection,
        config.vector_db.storage_path.display(),
        config.vector_db.dimensions
    );
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    let server = RagServer::new(config).await?;

    println!("\nJarbas starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  GET  /        - Status");
    println!("  POST /upload  - Upload a PDF (multipart field 'file')");
    println!("  POST /query   - Ask a question ({{\"pergunta\": ...}})");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
