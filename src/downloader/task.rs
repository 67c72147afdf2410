//! A single download task
//!
//! One task produces exactly one new image. Each attempt runs
//! fetch -> hash -> registry check -> write; the attempt is wrapped in the
//! duplicate ladder, which is wrapped in the network ladder.

use crate::config::RetryConfig;
use crate::downloader::fetcher::{FetchError, ImageSource};
use crate::downloader::retry::{retry, Backoff};
use crate::hash::{hash_bytes, Digest};
use crate::registry::{Registry, RegistryError};
use crate::storage::ImageStore;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Why a task attempt did not produce an image
#[derive(Debug, Error)]
pub enum TaskError {
    /// Transport failure, timeout or non-success status. Bounded retry.
    #[error("Network failure: {0}")]
    Network(#[from] FetchError),

    /// The image was already in the registry. Retried without limit.
    #[error("Duplicate image {0}")]
    Duplicate(Digest),

    /// The registry could not answer. Fatal for the task.
    #[error("Registry failure: {0}")]
    Registry(#[from] RegistryError),

    /// The digest was accepted but the file could not be written. Fatal for
    /// the task; the digest stays registered.
    #[error("Failed to write image {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        digest: Digest,
        source: std::io::Error,
    },
}

impl TaskError {
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Steps an attempt moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Fetching,
    Hashing,
    Checking,
    Persisting,
    Done,
    DuplicateDetected,
    NetworkError,
    Failed,
}

impl TaskState {
    /// Returns true if no further attempts follow this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// An image that was accepted and written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Digest of the image bytes
    pub digest: Digest,

    /// File name within the data directory
    pub filename: String,

    /// Full path of the written file
    pub path: PathBuf,

    /// Size of the image in bytes
    pub size: usize,
}

/// Fetches images until one with an unseen digest is written
pub struct DownloadTask {
    id: usize,
    source: Arc<dyn ImageSource>,
    registry: Arc<dyn Registry>,
    store: Arc<ImageStore>,
    network: Backoff,
    duplicate: Backoff,
}

impl DownloadTask {
    /// Creates a task sharing the given source, registry and store
    pub fn new(
        id: usize,
        source: Arc<dyn ImageSource>,
        registry: Arc<dyn Registry>,
        store: Arc<ImageStore>,
        retry: &RetryConfig,
    ) -> Self {
        Self {
            id,
            source,
            registry,
            store,
            network: Backoff::network(retry),
            duplicate: Backoff::duplicate(retry),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Runs the task to a terminal state
    ///
    /// # Returns
    ///
    /// * `Ok(ImageRecord)` - A new image was registered and written
    /// * `Err(TaskError)` - Network attempts ran out, or the registry or the
    ///   file write failed
    pub async fn run(&self) -> Result<ImageRecord, TaskError> {
        let duplicate = &self.duplicate;

        let result = retry(&self.network, TaskError::is_network, move || {
            retry(duplicate, TaskError::is_duplicate, move || self.attempt())
        })
        .await;

        match &result {
            Ok(record) => self.trace(TaskState::Done, Some(&record.filename)),
            Err(e) => {
                tracing::error!(task = self.id, error = %e, "Download task failed");
                self.trace(TaskState::Failed, None);
            }
        }

        result
    }

    /// One fetch -> hash -> check -> write pass
    async fn attempt(&self) -> Result<ImageRecord, TaskError> {
        self.trace(TaskState::Fetching, None);
        let bytes = match self.source.fetch().await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.trace(TaskState::NetworkError, None);
                return Err(e.into());
            }
        };

        self.trace(TaskState::Hashing, None);
        let digest = hash_bytes(&bytes);

        self.trace(TaskState::Checking, None);
        if !self.registry.try_insert(digest)? {
            self.trace(TaskState::DuplicateDetected, None);
            return Err(TaskError::Duplicate(digest));
        }

        // The digest is registered before the write, so a failed write can
        // leave an orphaned digest but never a duplicate file.
        self.trace(TaskState::Persisting, None);
        let (filename, path) = self
            .store
            .write(&bytes)
            .await
            .map_err(|(path, source)| TaskError::Persistence {
                path,
                digest,
                source,
            })?;

        Ok(ImageRecord {
            digest,
            filename,
            path,
            size: bytes.len(),
        })
    }

    fn trace(&self, state: TaskState, detail: Option<&str>) {
        tracing::trace!(
            task = self.id,
            state = ?state,
            terminal = state.is_terminal(),
            detail = detail.unwrap_or(""),
            "Task state"
        );
    }
}
