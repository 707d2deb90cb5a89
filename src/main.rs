//! url2snapshot entry point
//!
//! Command-line front end for the link snapshotter.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url2snapshot::config::{load_config_with_hash, Config};
use url2snapshot::crawler::{Scheduler, Snapshotter};
use url2snapshot::output::{load_statistics, print_statistics};
use url2snapshot::storage::open_store;

/// url2snapshot: keep a copy of everything your documents link to
///
/// Scans every document for outbound links and stores a one-time snapshot
/// of each linked page, falling back to the web archive when the page is
/// already gone.
#[derive(Parser, Debug)]
#[command(name = "url2snapshot")]
#[command(version)]
#[command(about = "Snapshots the pages your documents link to", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run a single batch pass and exit
    #[arg(long, conflicts_with_all = ["document", "init_db", "stats"])]
    once: bool,

    /// Process one document by id and exit
    #[arg(long, value_name = "ID", conflicts_with_all = ["init_db", "stats"])]
    document: Option<String>,

    /// With --document, wait the configured publish delay first
    #[arg(long, requires = "document")]
    deferred: bool,

    /// Create the snapshot table and exit
    #[arg(long, conflicts_with = "stats")]
    init_db: bool,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    setup_logging(cli.verbose, cli.quiet, &config.logging.level);
    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.init_db {
        handle_init_db(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if let Some(id) = cli.document.as_deref() {
        handle_document(&config, id, cli.deferred).await
    } else if cli.once {
        handle_once(&config).await
    } else {
        handle_schedule(&config).await
    }
}

/// Sets up the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise -q/-v override the configured level.
fn setup_logging(verbose: u8, quiet: bool, configured: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new(format!("url2snapshot={},warn", configured)),
                1 => EnvFilter::new("url2snapshot=debug,info"),
                2 => EnvFilter::new("url2snapshot=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --init-db: ensures the snapshot table exists
fn handle_init_db(config: &Config) -> anyhow::Result<()> {
    let store = open_store(
        Path::new(&config.storage.database_path),
        &config.storage.table_prefix,
    )?;
    println!(
        "✓ Table {} ready in {}",
        store.table(),
        config.storage.database_path
    );
    Ok(())
}

/// Handles --stats: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let store = open_store(
        Path::new(&config.storage.database_path),
        &config.storage.table_prefix,
    )?;
    let stats = load_statistics(&store)?;
    print_statistics(&stats);

    Ok(())
}

async fn handle_document(config: &Config, id: &str, deferred: bool) -> anyhow::Result<()> {
    let snapshotter = Arc::new(Snapshotter::from_config(config)?);

    let stats = if deferred {
        let scheduler = Scheduler::new(snapshotter, &config.schedule);
        scheduler
            .schedule_single(id)
            .await?
            .with_context(|| format!("standalone pass for {} failed", id))?
    } else {
        snapshotter.run_single_id(id).await?
    };

    println!(
        "{}: {} links, {} stored, {} pending",
        id,
        stats.admitted,
        stats.stored(),
        stats.pending()
    );
    Ok(())
}

async fn handle_once(config: &Config) -> anyhow::Result<()> {
    let snapshotter = Snapshotter::from_config(config)?;
    let stats = snapshotter.run_batch().await?;
    println!(
        "{} documents, {} links, {} stored, {} pending",
        stats.documents,
        stats.admitted,
        stats.stored(),
        stats.pending()
    );
    Ok(())
}

/// Runs batch passes on the configured interval until Ctrl-C
async fn handle_schedule(config: &Config) -> anyhow::Result<()> {
    let snapshotter = Arc::new(Snapshotter::from_config(config)?);
    let scheduler = Scheduler::new(snapshotter, &config.schedule);

    tracing::info!(
        "Scheduling a batch pass every {}s over {}",
        config.schedule.batch_interval_secs,
        config.documents.path
    );

    let totals = scheduler
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Unable to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    tracing::info!("Stored {} snapshots this session", totals.stored());
    Ok(())
}
