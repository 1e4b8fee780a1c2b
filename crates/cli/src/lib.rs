mod clear;
mod index;
mod lookup;
mod show;
mod stats;
mod watch;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stubdex_core::{IndexConfig, IndexManager};

#[derive(Parser)]
#[command(
    name = "stubdex",
    version,
    about = "Stub-based structural index over a source corpus",
    long_about = "Stubdex keeps a compact skeleton of every indexed file on disk and a \
                  key -> location index built from those skeletons, so lookups never \
                  reparse the corpus."
)]
pub struct Cli {
    /// JSON configuration file (index directory, batch size, compression)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Also print logs to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index a corpus directory
    #[command(
        long_about = "Loads the persisted index for the corpus, re-indexes files that changed \
                      since it was saved and writes it back. By default indices live in \
                      ~/.stubdex/indices/."
    )]
    Index {
        #[arg(value_name = "CORPUS_PATH")]
        path: PathBuf,
        /// Discard the persisted index and rebuild from scratch
        #[arg(long)]
        rebuild: bool,
    },
    /// Look up a key in the index
    Lookup {
        key: String,
        /// Corpus root. Defaults to the current directory.
        #[arg(long, value_name = "CORPUS_PATH")]
        path: Option<PathBuf>,
        /// Treat KEY as a prefix and list matching keys
        #[arg(long)]
        prefix: bool,
        /// Print hits as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the stored stub tree of one file
    Show {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Corpus root. Defaults to the current directory.
        #[arg(long, value_name = "CORPUS_PATH")]
        path: Option<PathBuf>,
    },
    /// Show index statistics
    Stats {
        #[arg(value_name = "CORPUS_PATH")]
        path: Option<PathBuf>,
    },
    /// Watch for file changes and update the index automatically
    Watch {
        #[arg(value_name = "CORPUS_PATH")]
        path: PathBuf,
    },
    /// Clear built indices
    #[command(
        long_about = "Removes built index files. If a path is provided, only that corpus's index \
                      is removed. Otherwise, all indices are cleared."
    )]
    Clear {
        #[arg(value_name = "CORPUS_PATH")]
        path: Option<PathBuf>,
    },
}

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn run() -> CliResult {
    let cli = Cli::parse();

    let component = match &cli.command {
        Commands::Watch { .. } => "watch",
        _ => "cli",
    };
    let _guard = stubdex_runtime::init_logging(component, cli.verbose);
    let config = stubdex_runtime::load_config(cli.config.as_deref())?;

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Index { path, rebuild } => rt.block_on(index::run(path, config, rebuild)),
        Commands::Lookup {
            key,
            path,
            prefix,
            json,
        } => rt.block_on(lookup::run(corpus_or_cwd(path), config, &key, prefix, json)),
        Commands::Show { file, path } => rt.block_on(show::run(corpus_or_cwd(path), config, file)),
        Commands::Stats { path } => rt.block_on(stats::run(corpus_or_cwd(path), config)),
        Commands::Watch { path } => rt.block_on(watch::run(path, config)),
        Commands::Clear { path } => rt.block_on(clear::run(path, config)),
    }
}

fn corpus_or_cwd(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Builds the manager for `path` and loads whatever index was persisted for it.
pub(crate) async fn open(
    path: &Path,
    config: IndexConfig,
) -> Result<Arc<IndexManager>, Box<dyn std::error::Error>> {
    let manager = stubdex_runtime::build_default_manager(path.to_path_buf(), config)?;
    let report = manager.load().await?;
    if !report.outdated_kinds.is_empty() {
        tracing::info!(
            "Outdated stub kinds {:?}, {} files queued for re-indexing",
            report.outdated_kinds,
            report.invalidated_files.len()
        );
    }
    Ok(manager)
}
