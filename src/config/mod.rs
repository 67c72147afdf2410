//! Configuration module for Fake-Faces
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional; [`Config::default`] mirrors the built-in
//! behavior (50 concurrent tasks, 120 second request timeout, 3 network
//! attempts).
//!
//! # Example
//!
//! ```no_run
//! use fake_faces::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("faces.toml")).unwrap();
//! println!("Fetching from: {}", config.download.endpoint);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, DownloadConfig, OutputConfig, RetryConfig, DEFAULT_ENDPOINT};

// Re-export parser and validation functions
pub use parser::{load_config, parse_config};
pub use validation::{validate, validate_endpoint};
