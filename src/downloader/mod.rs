//! Downloader module for fetching unique images
//!
//! This module contains the core download logic, including:
//! - HTTP fetching with failure classification
//! - Retry ladders for network failures and duplicate content
//! - Per-image download tasks
//! - Overall run coordination under a concurrency cap

mod coordinator;
mod fetcher;
pub mod retry;
mod task;

pub use coordinator::{Coordinator, RunResult, TaskFailure};
pub use fetcher::{build_http_client, FetchError, HttpFetcher, ImageSource};
pub use task::{DownloadTask, ImageRecord, TaskError, TaskState};

use crate::config::{validate, Config};
use crate::registry::{Registry, SeenRegistry};
use crate::storage::{open_storage, ImageStore, Storage};
use crate::FacesError;
use std::path::Path;
use std::sync::Arc;

/// Downloads `n` new unique images into `data_dir`
///
/// This is the main entry point for a download run. It will:
/// 1. Create the data directory if needed
/// 2. Load the digests of images obtained by earlier runs
/// 3. Fetch from the configured endpoint until `n` new images are saved or
///    tasks give up
/// 4. Save the updated digest set and the run outcome, even when some tasks
///    failed
///
/// # Arguments
///
/// * `config` - The downloader configuration
/// * `data_dir` - Directory receiving images and the registry file
/// * `n` - Number of unique images to obtain
///
/// # Returns
///
/// * `Ok(RunResult)` - The run finished; check [`RunResult::is_complete`]
/// * `Err(FacesError)` - The run could not start or its results could not be saved
///
/// # Example
///
/// ```no_run
/// use fake_faces::config::Config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let result = fake_faces::run(&Config::default(), Path::new("faces"), 10).await?;
/// println!("Saved {} images", result.succeeded());
/// # Ok(())
/// # }
/// ```
pub async fn run(config: &Config, data_dir: &Path, n: usize) -> Result<RunResult, FacesError> {
    let source = Arc::new(HttpFetcher::from_config(&config.download)?);
    tracing::info!("Fetching from {}", source.url());

    run_with(config, data_dir, n, source, |seen| {
        Arc::new(seen) as Arc<dyn Registry>
    })
    .await
}

/// Same as [`run`], with an explicit image source and registry wrapper
///
/// `wrap_registry` receives the registry loaded from the data directory and
/// returns the registry tasks will use. Whatever it returns is what gets
/// saved at the end of the run.
pub async fn run_with<W>(
    config: &Config,
    data_dir: &Path,
    n: usize,
    source: Arc<dyn ImageSource>,
    wrap_registry: W,
) -> Result<RunResult, FacesError>
where
    W: FnOnce(SeenRegistry) -> Arc<dyn Registry>,
{
    validate(config)?;

    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|source| FacesError::DataDir {
            path: data_dir.display().to_string(),
            source,
        })?;

    let registry_path = data_dir.join(&config.output.registry_file);
    let mut storage = open_storage(&registry_path)?;

    let seen = SeenRegistry::from_digests(storage.load_digests()?);
    tracing::info!(
        "Loaded {} known image digests from {}",
        seen.len(),
        registry_path.display()
    );

    let run_id = storage.create_run(&config.fingerprint()?, n)?;
    let registry = wrap_registry(seen);

    let coordinator = Coordinator::new(
        config,
        source,
        Arc::clone(&registry),
        ImageStore::new(data_dir, config.download.image_extension.clone()),
    );
    let result = coordinator.run_all(n).await;

    let added = storage.save_digests(&registry.snapshot(), run_id)?;
    storage.finish_run(run_id, result.summary())?;
    tracing::info!(
        "Recorded {} new digests in {} (run {})",
        added,
        registry_path.display(),
        run_id
    );

    Ok(result)
}
