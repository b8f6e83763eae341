//! Bulkfetch main entry point
//!
//! Command-line interface for the bulk URL fetcher: loads the TOML
//! configuration, opens the filesystem object store, runs the pipeline and
//! reports the run summary. Any fatal error maps to a non-zero exit code.

use anyhow::Context;
use bulkfetch::config::load_config;
use bulkfetch::pipeline::run_pipeline;
use bulkfetch::store::FsStore;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Bulkfetch: bulk URL fetching with content-addressed deduplication
///
/// Bulkfetch downloads every URL in a configuration file, throttling
/// requests per host, stores each distinct payload exactly once (keyed by
/// SHA-384 checksum), records every source of a payload in a checksum
/// index, and writes a JSON run log for downstream parsers.
#[derive(Parser, Debug)]
#[command(name = "bulkfetch")]
#[command(version = "1.0.0")]
#[command(about = "Bulk URL fetching with content-addressed deduplication", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Index of the first task to process (overrides the config file)
    #[arg(long)]
    offset: Option<usize>,

    /// Maximum number of tasks to process (overrides the config file)
    #[arg(long)]
    limit: Option<usize>,

    /// Run identifier embedded in the log file name (overrides the config file)
    #[arg(long = "fetch-id")]
    fetch_id: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Starting bulkfetch");
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    // CLI knobs override the config file for sharded runs.
    if let Some(offset) = cli.offset {
        config.fetch.offset = offset;
    }
    if let Some(limit) = cli.limit {
        config.fetch.limit = Some(limit);
    }
    if let Some(fetch_id) = cli.fetch_id {
        config.fetch.id = fetch_id;
    }

    let store = Arc::new(
        FsStore::new(Path::new(&config.storage.dir))
            .with_context(|| format!("failed to open store at {}", config.storage.dir))?,
    );

    let summary = run_pipeline(&config, store).await?;

    tracing::info!(
        "Successfully completed bulkfetch in {:?}: {} novel, {} errors, {} total ({})",
        summary.duration,
        summary.novel,
        summary.errors,
        summary.total,
        summary.log_location
    );

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bulkfetch=info,warn"),
            1 => EnvFilter::new("bulkfetch=debug,info"),
            2 => EnvFilter::new("bulkfetch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
