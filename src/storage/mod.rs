//! Storage module for persisting download results
//!
//! This module handles everything written to the data directory:
//! - The SQLite registry file remembering every accepted digest
//! - Run history (when, how many requested, how many obtained)
//! - The image files themselves

mod images;
mod schema;
mod sqlite;
mod traits;

pub use images::ImageStore;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::path::Path;

/// Opens or creates the registry database at `path`
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Represents a download run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub requested: i64,
    pub succeeded: i64,
    pub failed: i64,
    pub status: RunStatus,
}

/// Outcome counts recorded when a run finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Status implied by the counts
    pub fn status(&self) -> RunStatus {
        if self.failed == 0 && self.succeeded == self.requested {
            RunStatus::Completed
        } else {
            RunStatus::Partial
        }
    }
}

/// Status of a download run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Partial,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Partial => "partial",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            _ => None,
        }
    }
}
