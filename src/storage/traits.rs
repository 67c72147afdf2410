//! Storage traits and error types
//!
//! This module defines the trait interface for registry persistence backends
//! and associated error types.

use crate::hash::Digest;
use crate::storage::{RunRecord, RunSummary};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt digest in registry: '{0}'")]
    CorruptDigest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for registry persistence backends
///
/// A backend remembers every accepted digest across runs, plus a short
/// history of runs.
pub trait Storage {
    // ===== Digest Persistence =====

    /// Loads every digest recorded by earlier runs
    fn load_digests(&self) -> StorageResult<Vec<Digest>>;

    /// Records digests, ignoring ones already stored
    ///
    /// # Arguments
    ///
    /// * `digests` - Digests to store
    /// * `run_id` - The run credited with digests not seen before
    ///
    /// # Returns
    ///
    /// The number of digests that were newly stored
    fn save_digests(&mut self, digests: &[Digest], run_id: i64) -> StorageResult<usize>;

    /// Counts stored digests
    fn count_digests(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Records the start of a run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Fingerprint of the effective configuration
    /// * `requested` - Number of unique images requested
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, requested: usize) -> StorageResult<i64>;

    /// Records the outcome of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, summary: RunSummary) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Lists all runs, oldest first
    fn list_runs(&self) -> StorageResult<Vec<RunRecord>>;
}
