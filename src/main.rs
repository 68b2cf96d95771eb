mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scout_core::bootstrap;
use scout_index::SearchMode;

#[derive(Parser)]
#[command(name = "scout")]
#[command(author, version, about = "Semantic code search over an incrementally indexed source tree", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index (or incrementally re-index) a source tree
    Index {
        /// Project root (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Number of concurrent embedding requests
        #[arg(short, long)]
        workers: Option<usize>,

        /// Print the pass report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search the index semantically
    #[command(visible_alias = "s")]
    Search {
        /// The search query
        query: String,

        /// Vector space to search: code, docs or hybrid
        #[arg(short, long)]
        mode: Option<SearchMode>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = bootstrap::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Index {
            path,
            workers,
            json,
        } => {
            if let Some(workers) = workers {
                anyhow::ensure!(workers > 0, "--workers must be greater than zero");
                config.embedding.workers = workers;
            }
            let root = path
                .canonicalize()
                .with_context(|| format!("cannot index {}", path.display()))?;

            tracing::debug!(root = %root.display(), workers = config.embedding.workers, "starting index pass");
            let indexer = bootstrap::build_indexer(&config)?;
            let report = indexer
                .index_project(&root)
                .await
                .context("indexing failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::render_report(&report));
            }
        }
        Commands::Search {
            query,
            mode,
            limit,
            json,
        } => {
            let mode = mode.unwrap_or(config.search.mode);
            let limit = limit.unwrap_or(config.search.limit);

            tracing::debug!(%mode, limit, "searching");
            let retriever = bootstrap::build_retriever(&config)?;
            let hits = retriever
                .search(&query, mode, limit)
                .await
                .context("search failed")?;

            if json {
                println!("{}", output::render_json(&query, mode, &hits)?);
            } else {
                print!("{}", output::render_text(&query, &hits));
            }
        }
    }
    Ok(())
}
