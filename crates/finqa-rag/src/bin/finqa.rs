//! Financial document Q&A from the command line
//!
//! Run with: cargo run -p finqa-rag --bin finqa -- report.pdf q1.xlsx

use anyhow::Context;
use clap::Parser;
use finqa_rag::{Error, LlmProvider, OllamaClient, RagConfig, Session, Upload};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "finqa", version, about = "Ask questions about PDF and spreadsheet files")]
struct Cli {
    /// Configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Question to ask; repeat for several. Reads stdin when omitted
    #[arg(short = 'q', long = "question")]
    questions: Vec<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// PDF or spreadsheet files to process
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "finqa_rag=debug,finqa=debug"
    } else {
        "finqa_rag=info,finqa=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match &cli.config {
        Some(path) => {
            let (config, err) = RagConfig::load_or_default(path);
            if let Some(err) = err {
                eprintln!("Invalid configuration, using defaults: {}", err);
            }
            config
        }
        None => RagConfig::default(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM model: {}", config.ollama.model);
    tracing::info!("  - Chunk size: {}", config.retrieval.chunk_size);
    tracing::info!("  - Chunk overlap: {}", config.retrieval.chunk_overlap);
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    let client = Arc::new(OllamaClient::new(&config.ollama).context("creating Ollama client")?);
    if !client.health_check().await.unwrap_or(false) {
        tracing::warn!("Ollama not available at {}", client.base_url());
        tracing::warn!("Please start Ollama:");
        tracing::warn!("  1. Start: ollama serve");
        tracing::warn!("  2. Pull the model: ollama pull {}", config.ollama.model);
    }

    let mut uploads = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match std::fs::read(path) {
            Ok(data) => uploads.push(Upload::new(filename, data)),
            Err(err) => eprintln!("Error reading {}: {}", path.display(), err),
        }
    }

    let mut session = Session::new(config, client);

    match session.process(&uploads) {
        Ok(report) => {
            for failure in &report.failures {
                eprintln!("Error processing {}: {}", failure.filename, failure.error);
            }
            for doc in &report.documents {
                println!(
                    "Parsed {} ({}): {} pages/sheets, {} tables",
                    doc.filename,
                    doc.file_type.display_name(),
                    doc.page_count,
                    doc.tables.len()
                );
            }
            println!("Processing completed: {} chunks", report.chunk_count);
        }
        Err(Error::NoDocuments) => {
            eprintln!("Please upload at least one document.");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }

    if session.knowledge_base().is_empty() {
        eprintln!("No text could be extracted; nothing to ask about.");
        return Ok(());
    }

    if cli.questions.is_empty() {
        println!("\nAsk a question (Ctrl+D to finish):");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            ask(&mut session, &line).await;
        }
    } else {
        for question in &cli.questions {
            ask(&mut session, question).await;
        }
    }

    if !session.transcript().is_empty() {
        println!("\nChat History");
        for (i, turn) in session.transcript().iter().enumerate() {
            println!("Q{}: {}", i + 1, turn.question);
            println!("A{}: {}", i + 1, turn.answer);
            println!("---");
        }
    }

    Ok(())
}

async fn ask(session: &mut Session, question: &str) {
    match session.ask(question).await {
        Ok(turn) => println!("\n{}\n", turn.answer),
        Err(err @ Error::GenerationTimeout { .. }) => eprintln!("{}", err),
        Err(err) if err.is_generation_failure() => eprintln!("API request failed: {}", err),
        Err(err) => eprintln!("{}", err),
    }
}
