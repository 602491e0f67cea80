//! # Desk Copilot CLI (`desk`)
//!
//! Ingest documents into the vector index and knowledge graph, then ask
//! questions against them.
//!
//! ## Usage
//!
//! ```bash
//! desk --config ./config/desk.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `desk init` | Create the SQLite vector schema and Neo4j constraints |
//! | `desk ingest <file>` | Ingest a text or PDF file |
//! | `desk ingest-pages <json>` | Ingest crawled pages |
//! | `desk plan "<question>"` | Print the retrieval plan |
//! | `desk ask "<question>"` | Plan, retrieve, and print citations |
//! | `desk health` | Ping both stores |
//!
//! ## Examples
//!
//! ```bash
//! # Persistent stores
//! desk init --config ./config/desk.toml
//! desk ingest ./docs/runbook.pdf --title "Ops Runbook"
//! desk ask "Who owns the Alpha escalation queue?" --top-k 4
//!
//! # One-shot with the in-memory stores
//! desk ask "What is Widget Alpha?" --ingest ./docs/widget.md
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use desk_copilot::backends::Backends;
use desk_copilot::{ask, config, health, ingest, logging, migrate};

/// Desk Copilot: graph-aware retrieval over local documents.
#[derive(Parser)]
#[command(
    name = "desk",
    about = "Desk Copilot: hybrid vector and knowledge-graph retrieval for support questions",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/desk.toml` when that file exists, otherwise
    /// built-in defaults (in-memory stores, stub embedder).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging for both crates.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare the configured persistent stores. Idempotent.
    Init,

    /// Ingest a text or PDF file.
    ///
    /// Files ending in `.pdf` are treated as PDFs automatically.
    Ingest {
        file: PathBuf,

        /// Document title (defaults to the file name).
        #[arg(long)]
        title: Option<String>,

        /// Force PDF extraction.
        #[arg(long)]
        pdf: bool,
    },

    /// Ingest a JSON array of `{url, title, text}` pages.
    IngestPages { json: PathBuf },

    /// Print the retrieval plan for a question.
    Plan {
        question: String,

        #[arg(long)]
        top_k: Option<usize>,

        /// Files to ingest first (useful with the in-memory stores).
        #[arg(long)]
        ingest: Vec<PathBuf>,
    },

    /// Plan, retrieve, and print citations.
    Ask {
        question: String,

        #[arg(long)]
        top_k: Option<usize>,

        /// Files to ingest first (useful with the in-memory stores).
        #[arg(long)]
        ingest: Vec<PathBuf>,
    },

    /// Ping both stores and print counts.
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cfg = config::load_config_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Init => {
            migrate::run_init(&cfg).await?;
        }
        Commands::Ingest { file, title, pdf } => {
            let backends = Backends::from_config(&cfg).await?;
            ingest::run_ingest(&backends, &file, title.as_deref(), pdf).await?;
        }
        Commands::IngestPages { json } => {
            let backends = Backends::from_config(&cfg).await?;
            ingest::run_ingest_pages(&backends, &json).await?;
        }
        Commands::Plan {
            question,
            top_k,
            ingest: files,
        } => {
            let backends = Backends::from_config(&cfg).await?;
            preload(&backends, &files).await?;
            ask::run_plan(&backends, &question, top_k).await?;
        }
        Commands::Ask {
            question,
            top_k,
            ingest: files,
        } => {
            let backends = Backends::from_config(&cfg).await?;
            preload(&backends, &files).await?;
            ask::run_ask(&backends, &question, top_k).await?;
        }
        Commands::Health => {
            let backends = Backends::from_config(&cfg).await?;
            health::run_health(&backends).await?;
        }
    }

    Ok(())
}

async fn preload(backends: &Backends, files: &[PathBuf]) -> Result<()> {
    for file in files {
        let report = ingest::ingest_file(backends, file, None, false).await?;
        tracing::info!(file = %file.display(), chunks = report.ingest().chunks, "preloaded");
    }
    Ok(())
}
