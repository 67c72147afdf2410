//! Fake-Faces main entry point
//!
//! This is the command-line interface for the Fake-Faces image harvester.

use anyhow::Context;
use clap::Parser;
use fake_faces::config::{load_config, validate, Config};
use fake_faces::storage::{SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Fake-Faces: a deduplicating image harvester
///
/// Fake-Faces downloads images from an endpoint that returns a random image
/// on every request, skips any image it has already saved (in this or any
/// earlier run against the same directory), and retries until the requested
/// number of new images has been saved.
#[derive(Parser, Debug)]
#[command(name = "fake-faces")]
#[command(version)]
#[command(about = "A deduplicating image harvester", long_about = None)]
struct Cli {
    /// Directory receiving the images and the registry of seen images
    #[arg(value_name = "DATA_DIR")]
    data_dir: PathBuf,

    /// Number of new unique images to download
    #[arg(
        value_name = "N_IMAGES",
        value_parser = clap::value_parser!(u64).range(1..),
        required_unless_present = "stats"
    )]
    n_images: Option<u64>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the image endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Override the maximum number of concurrent downloads
    #[arg(long, value_name = "K")]
    concurrency: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the registry size and run history for DATA_DIR and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.stats {
        handle_stats(&config, &cli.data_dir)?;
        return Ok(ExitCode::SUCCESS);
    }

    // clap enforces presence unless --stats was given
    let n = cli.n_images.unwrap_or(1) as usize;
    handle_download(&config, &cli.data_dir, n).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fake_faces=info,warn"),
            1 => EnvFilter::new("fake_faces=debug,info"),
            2 => EnvFilter::new("fake_faces=trace,debug"),
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

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(endpoint) = &cli.endpoint {
        config.download.endpoint = endpoint.clone();
    }
    if let Some(concurrency) = cli.concurrency {
        config.download.max_concurrent = concurrency;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --stats mode: shows registry size and run history
fn handle_stats(config: &Config, data_dir: &Path) -> anyhow::Result<()> {
    let registry_path = data_dir.join(&config.output.registry_file);
    println!("Registry: {}\n", registry_path.display());

    if !registry_path.exists() {
        println!("No registry yet; nothing has been downloaded into this directory.");
        return Ok(());
    }

    let storage = SqliteStorage::new(&registry_path)?;
    println!("Known images: {}", storage.count_digests()?);

    let runs = storage.list_runs()?;
    println!("\nRuns ({}):", runs.len());
    for run in &runs {
        println!(
            "  #{} {} -> {}  {}/{} saved, {} failed  [{}]",
            run.id,
            run.started_at,
            run.finished_at.as_deref().unwrap_or("-"),
            run.succeeded,
            run.requested,
            run.failed,
            run.status.to_db_string()
        );
    }

    Ok(())
}

/// Handles the main download operation
async fn handle_download(config: &Config, data_dir: &Path, n: usize) -> anyhow::Result<ExitCode> {
    tracing::info!(
        "Downloading {} unique images into {} ({} concurrent)",
        n,
        data_dir.display(),
        config.download.max_concurrent
    );

    let result = fake_faces::run(config, data_dir, n)
        .await
        .context("Download run failed")?;

    for failure in &result.failures {
        tracing::error!("{}", failure);
    }

    println!(
        "Downloaded {} of {} unique images into {}",
        result.succeeded(),
        n,
        data_dir.display()
    );

    if result.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
