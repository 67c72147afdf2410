use serde::{Deserialize, Serialize};

/// Default endpoint serving one random face per request
pub const DEFAULT_ENDPOINT: &str = "https://thispersondoesnotexist.com";

/// Main configuration structure for Fake-Faces
///
/// Every field has a default, so an empty TOML file (or no file at all) is a
/// valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub download: DownloadConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
}

/// Endpoint and concurrency settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// URL returning a different random image on every GET
    pub endpoint: String,

    /// Maximum number of download tasks in flight at once
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Per-request timeout, covering connect, headers and body (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// User-Agent header sent with each request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// File extension given to saved images
    #[serde(rename = "image-extension")]
    pub image_extension: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_concurrent: 50,
            request_timeout_secs: 120,
            user_agent: format!("fake-faces/{}", env!("CARGO_PKG_VERSION")),
            image_extension: "jpg".to_string(),
        }
    }
}

/// Backoff settings for the two retry ladders
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts allowed for network failures before a task gives up
    #[serde(rename = "network-max-attempts")]
    pub network_max_attempts: u32,

    /// First delay after a network failure (milliseconds)
    #[serde(rename = "network-base-delay-ms")]
    pub network_base_delay_ms: u64,

    /// First delay after a duplicate image (milliseconds)
    #[serde(rename = "duplicate-base-delay-ms")]
    pub duplicate_base_delay_ms: u64,

    /// Upper bound on any single backoff delay (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            network_max_attempts: 3,
            network_base_delay_ms: 2_000,
            duplicate_base_delay_ms: 1_000,
            max_delay_ms: 60_000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Name of the SQLite registry file kept inside the data directory
    #[serde(rename = "registry-file")]
    pub registry_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            registry_file: "seen_images.db".to_string(),
        }
    }
}
