//! DocuScope terminal client
//!
//! Run with: cargo run -p docuscope --bin docuscope -- data/reviews.csv

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use docuscope::interactive::{
    format_summary, prompt_for_path, read_questions, run_batch, run_chat, STANDARD_QUESTIONS,
};
use docuscope::providers::ollama_providers;
use docuscope::{RagConfig, Session};

#[derive(Parser)]
#[command(name = "docuscope")]
#[command(about = "Ask questions about a CSV or PDF file using local Ollama models", long_about = None)]
#[command(version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Document to load; prompted for when omitted
    file: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    overrides: Overrides,
}

#[derive(Subcommand)]
enum Commands {
    /// Load one document and answer questions interactively (default)
    Chat {
        /// Document to load; prompted for when omitted
        file: Option<PathBuf>,
    },

    /// Ask the same questions of several documents and save the answers as JSON
    Batch {
        /// Documents to analyze
        #[arg(required = true)]
        documents: Vec<PathBuf>,

        /// Question file, one question per line (defaults to a standard set)
        #[arg(short, long)]
        questions: Option<PathBuf>,

        /// Output JSON file
        #[arg(short, long, default_value = "batch_analysis_results.json")]
        output: PathBuf,
    },
}

/// Command-line overrides for configuration values
#[derive(Args)]
struct Overrides {
    /// Ollama base URL
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Embedding model name
    #[arg(long, global = true)]
    embedding_model: Option<String>,

    /// Embedding dimensions of the embedding model
    #[arg(long, global = true)]
    embedding_dimensions: Option<usize>,

    /// Generation model name
    #[arg(long, global = true)]
    generation_model: Option<String>,

    /// Number of chunks retrieved per question
    #[arg(short = 'k', long, global = true)]
    top_k: Option<usize>,

    /// Maximum chunk size in characters
    #[arg(long, global = true)]
    chunk_size: Option<usize>,

    /// Characters shared by consecutive chunks
    #[arg(long, global = true)]
    chunk_overlap: Option<usize>,

    /// Sampling temperature (0.0 gives repeatable answers)
    #[arg(short, long, global = true)]
    temperature: Option<f32>,
}

impl Overrides {
    fn apply(&self, config: &mut RagConfig) {
        if let Some(url) = &self.ollama_url {
            config.llm.base_url = url.clone();
        }
        if let Some(model) = &self.embedding_model {
            config.llm.embed_model = model.clone();
        }
        if let Some(dimensions) = self.embedding_dimensions {
            config.embeddings.dimensions = dimensions;
        }
        if let Some(model) = &self.generation_model {
            config.llm.generate_model = model.clone();
        }
        if let Some(k) = self.top_k {
            config.retrieval.top_k = k;
        }
        if let Some(size) = self.chunk_size {
            config.chunking.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunking.chunk_overlap = overlap;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "docuscope=warn",
        1 => "docuscope=info",
        _ => "docuscope=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_setup_hints(config: &RagConfig) {
    eprintln!("\n{}", style("Make sure Ollama is running and the models are installed:").yellow());
    eprintln!("  1. Start the server:   ollama serve");
    eprintln!("  2. Embedding model:    ollama pull {}", config.llm.embed_model);
    eprintln!("  3. Generation model:   ollama pull {}", config.llm.generate_model);
    eprintln!("  (Ollama URL: {})", config.llm.base_url);
}

async fn load(session: &mut Session, path: &Path) -> docuscope::Result<()> {
    let pb = spinner(format!("Loading {}...", path.display()));
    let result = session.load_document(path).await;
    pb.finish_and_clear();

    let summary = result?;
    println!("{}", format_summary(&summary));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = RagConfig::load(cli.config.as_deref())?;
    cli.overrides.apply(&mut config);
    config.validate()?;

    println!(
        "{}\n{}\n",
        style("DocuScope").bold().cyan(),
        style("Ask questions about your CSV and PDF files").dim()
    );

    let (embedder, llm) = ollama_providers(&config.llm, &config.embeddings)?;
    let mut session = Session::new(&config, embedder, llm);

    let pb = spinner("Checking models...");
    let init = session.initialize().await;
    pb.finish_and_clear();
    if let Err(e) = init {
        eprintln!("{} {}", style("✗").red(), e);
        print_setup_hints(&config);
        return Err(e).context("model initialization failed");
    }
    println!(
        "{} Models ready ({}, {})",
        style("✓").green(),
        config.llm.embed_model,
        config.llm.generate_model
    );

    match cli.command {
        Some(Commands::Batch {
            documents,
            questions,
            output,
        }) => {
            let questions: Vec<String> = match questions {
                Some(path) => read_questions(&path)?,
                None => STANDARD_QUESTIONS.iter().map(|q| q.to_string()).collect(),
            };
            if questions.is_empty() {
                anyhow::bail!("no questions to ask");
            }

            println!(
                "Analyzing {} documents with {} questions each",
                documents.len(),
                questions.len()
            );

            let mut stdout = io::stdout();
            let report = run_batch(&mut session, &documents, &questions, &mut stdout).await?;

            let json = serde_json::to_string_pretty(&report.to_json()?)?;
            std::fs::write(&output, json)
                .with_context(|| format!("failed to write {}", output.display()))?;
            println!("\n{} Results saved to {}", style("✓").green(), output.display());
        }
        Some(Commands::Chat { file }) => chat(&mut session, file).await?,
        None => chat(&mut session, cli.file).await?,
    }

    Ok(())
}

async fn chat(session: &mut Session, file: Option<PathBuf>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stdout = io::stdout();

    if let Some(path) = file {
        load(session, &path).await?;
    } else {
        loop {
            let Some(path) = prompt_for_path(&mut input, &mut stdout)? else {
                return Ok(());
            };
            match load(session, &path).await {
                Ok(()) => break,
                Err(e) => eprintln!("{} {}", style("✗").red(), e),
            }
        }
    }

    writeln!(
        stdout,
        "\nAsk a question about the document. Type 'exit' or press Ctrl-D to quit; Ctrl-C cancels a running question."
    )?;

    let stats = run_chat(session, &mut input, &mut stdout).await?;
    tracing::info!("Session ended: {} answered, {} failed", stats.answered, stats.failed);
    Ok(())
}
