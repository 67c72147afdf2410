//! Fake-Faces: a deduplicating image harvester
//!
//! This crate fetches images from an endpoint that serves a different random
//! image on every request, keeps only content it has never seen before, and
//! remembers what it has seen across runs so repeated invocations keep adding
//! new images.

pub mod config;
pub mod downloader;
pub mod hash;
pub mod registry;
pub mod storage;

use thiserror::Error;

/// Main error type for Fake-Faces operations
///
/// Per-image failures never show up here; they are collected into
/// [`downloader::RunResult`]. This type covers failures that stop a run
/// from starting or from recording its outcome.
#[derive(Debug, Error)]
pub enum FacesError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Fake-Faces operations
pub type Result<T> = std::result::Result<T, FacesError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use downloader::{run, run_with, Coordinator, RunResult};
pub use hash::{hash_bytes, Digest};
pub use registry::{Registry, SeenRegistry};
