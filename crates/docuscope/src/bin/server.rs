//! DocuScope server binary
//!
//! Run with: cargo run -p docuscope --bin docuscope-server

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docuscope::{config::RagConfig, server::RagServer};

#[derive(Parser)]
#[command(name = "docuscope-server")]
#[command(about = "HTTP API for asking questions about uploaded CSV and PDF files", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Ollama base URL
    #[arg(long)]
    ollama_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docuscope=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         DocuScope                         ║
║          Questions and answers over CSV and PDF           ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let mut config = RagConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(url) = cli.ollama_url {
        config.llm.base_url = url;
    }
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    let server = RagServer::new(config.clone())?;

    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    if server.state().check_ready().await {
        tracing::info!("Ollama is running with both models installed");
    } else {
        tracing::warn!("Ollama or its models are not available at {}", config.llm.base_url);
        tracing::warn!("Sessions cannot be created until this is fixed:");
        tracing::warn!("  1. Start: ollama serve");
        tracing::warn!(
            "  2. Pull models: ollama pull {} && ollama pull {}",
            config.llm.embed_model,
            config.llm.generate_model
        );
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/sessions              - Create a session");
    println!("  POST   /api/sessions/:id/document - Upload a CSV or PDF file");
    println!("  POST   /api/sessions/:id/query    - Ask a question");
    println!("  DELETE /api/sessions/:id          - End a session");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
