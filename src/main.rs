//! # Article Analyzer CLI (`article-analyzer`)
//!
//! Every command takes the documents to work on as paths (files or
//! directories) and builds what it needs in memory for that run.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `article-analyzer index <paths...>` | Build the passage index and report it |
//! | `article-analyzer ask "<question>" <paths...>` | Answer a question from the documents |
//! | `article-analyzer summarize <paths...>` | Per-document and corpus summaries |
//! | `article-analyzer analyze <paths...>` | Summaries, sentiment and entities |
//!
//! ## Examples
//!
//! ```bash
//! # Offline run with the hashing embedder
//! article-analyzer --config ./config/offline.toml index ./articles
//!
//! # Ask with more supporting passages
//! article-analyzer ask "When was the bridge opened?" ./articles --top-k 8
//!
//! # Machine-readable corpus report
//! article-analyzer --json analyze ./articles > report.json
//! ```
//!
//! Logs go to stderr and are filtered with `RUST_LOG`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use article_analyzer::{analyze, ask, config, index_cmd, summarize_cmd};

const DEFAULT_LOG_FILTER: &str = "article_analyzer=info,article_analyzer_core=info";

/// Article Analyzer: summaries, sentiment, entities and question answering
/// over a set of documents.
///
/// Without `--config` the built-in defaults are used (local embeddings,
/// LLM disabled).
#[derive(Parser)]
#[command(
    name = "article-analyzer",
    about = "Summaries, sentiment, entities and question answering over a set of documents",
    version
)]
struct Cli {
    /// Path to a configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of the text report.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the documents and build the passage index.
    ///
    /// Prints document and passage counts, the embedding dimension and any
    /// documents that could not be embedded.
    Index {
        /// Files or directories to load.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Answer a question from the documents.
    ///
    /// Retrieves the passages most similar to the question and extracts
    /// the answer from them. Supporting passages are listed with scores.
    Ask {
        /// The question.
        question: String,

        /// Files or directories to load.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Number of passages to retrieve (overrides `[retrieval].top_k`).
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Summarize each document and the corpus as a whole.
    Summarize {
        /// Files or directories to load.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Full article analysis: summary, sentiment, entities and length per
    /// document, plus corpus-level summary, sentiment distribution and top
    /// entities.
    Analyze {
        /// Files or directories to load.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_or_default(cli.config.as_ref())?;

    match cli.command {
        Commands::Index { paths } => {
            index_cmd::run_index(&cfg, &paths, cli.json).await?;
        }
        Commands::Ask {
            question,
            paths,
            top_k,
        } => {
            ask::run_ask(&cfg, &question, &paths, top_k, cli.json).await?;
        }
        Commands::Summarize { paths } => {
            summarize_cmd::run_summarize(&cfg, &paths, cli.json).await?;
        }
        Commands::Analyze { paths } => {
            analyze::run_analyze(&cfg, &paths, cli.json).await?;
        }
    }

    Ok(())
}
