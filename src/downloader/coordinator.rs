//! Download coordinator - runs N tasks under a concurrency cap
//!
//! This module launches one [`DownloadTask`] per requested image, gates them
//! with a semaphore, waits for every task to reach a terminal state, and
//! aggregates the outcomes. A failed task never cancels its siblings.

use crate::config::{Config, RetryConfig};
use crate::downloader::fetcher::ImageSource;
use crate::downloader::task::{DownloadTask, ImageRecord, TaskError};
use crate::registry::Registry;
use crate::storage::{ImageStore, RunSummary};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// How often (in completed tasks) a progress line is logged
const PROGRESS_EVERY: usize = 10;

/// A task that ended without producing an image
#[derive(Debug)]
pub enum TaskFailure {
    /// The task returned a fatal error
    Fatal { task: usize, error: TaskError },

    /// The task panicked or was aborted
    Panicked { message: String },
}

impl std::fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fatal { task, error } => write!(f, "task {}: {}", task, error),
            Self::Panicked { message } => write!(f, "task panicked: {}", message),
        }
    }
}

/// Aggregate outcome of one coordinator run
#[derive(Debug, Default)]
pub struct RunResult {
    /// Number of unique images requested
    pub requested: usize,

    /// Images written, in completion order
    pub records: Vec<ImageRecord>,

    /// Tasks that ended in a fatal failure
    pub failures: Vec<TaskFailure>,
}

impl RunResult {
    pub fn succeeded(&self) -> usize {
        self.records.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if every requested image was obtained
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.records.len() == self.requested
    }

    /// File names of the written images
    pub fn filenames(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.filename.as_str()).collect()
    }

    /// Counts for the run history
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            requested: self.requested,
            succeeded: self.succeeded(),
            failed: self.failed(),
        }
    }
}

/// Main downloader coordinator structure
pub struct Coordinator {
    source: Arc<dyn ImageSource>,
    registry: Arc<dyn Registry>,
    store: Arc<ImageStore>,
    retry: RetryConfig,
    max_concurrent: usize,
}

impl Coordinator {
    /// Creates a coordinator
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the concurrency cap and retry settings
    /// * `source` - Where images come from
    /// * `registry` - Shared digest registry, fresh or pre-populated
    /// * `store` - Where accepted images are written
    pub fn new(
        config: &Config,
        source: Arc<dyn ImageSource>,
        registry: Arc<dyn Registry>,
        store: ImageStore,
    ) -> Self {
        Self {
            source,
            registry,
            store: Arc::new(store),
            retry: config.retry.clone(),
            max_concurrent: config.download.max_concurrent.max(1),
        }
    }

    /// The registry shared by this coordinator's tasks
    pub fn registry(&self) -> &Arc<dyn Registry> {
        &self.registry
    }

    /// Runs `n` download tasks and waits for all of them
    ///
    /// At most `max_concurrent` tasks hold a permit at once; a permit is
    /// released when its task reaches a terminal state, success or not.
    pub async fn run_all(&self, n: usize) -> RunResult {
        tracing::info!(
            "Starting {} download tasks (max {} concurrent)",
            n,
            self.max_concurrent
        );

        let start_time = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for id in 0..n {
            let task = DownloadTask::new(
                id,
                Arc::clone(&self.source),
                Arc::clone(&self.registry),
                Arc::clone(&self.store),
                &self.retry,
            );
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // Acquire only fails on a closed semaphore; this one never closes.
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = task.run().await;
                (task.id(), outcome)
            });
        }

        let mut result = RunResult {
            requested: n,
            ..RunResult::default()
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(record))) => {
                    tracing::debug!("Saved {} ({})", record.filename, record.digest);
                    result.records.push(record);
                }
                Ok((task, Err(error))) => {
                    result.failures.push(TaskFailure::Fatal { task, error });
                }
                Err(join_error) => {
                    tracing::error!("Download task did not complete: {}", join_error);
                    result.failures.push(TaskFailure::Panicked {
                        message: join_error.to_string(),
                    });
                }
            }

            let done = result.succeeded() + result.failed();
            if done % PROGRESS_EVERY == 0 && done < n {
                let elapsed = start_time.elapsed();
                tracing::info!(
                    "Progress: {}/{} tasks finished ({} saved, {} failed), {:.2} images/sec",
                    done,
                    n,
                    result.succeeded(),
                    result.failed(),
                    result.succeeded() as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
                );
            }
        }

        tracing::info!(
            "Downloads finished: {} of {} images saved, {} failed in {:?}",
            result.succeeded(),
            n,
            result.failed(),
            start_time.elapsed()
        );

        result
    }
}
