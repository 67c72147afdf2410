use crate::config::types::{Config, DownloadConfig, OutputConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent download tasks
const MAX_CONCURRENT_LIMIT: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_download_config(&config.download)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates endpoint and concurrency settings
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    validate_endpoint(&config.endpoint)?;

    if config.max_concurrent < 1 || config.max_concurrent > MAX_CONCURRENT_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-concurrent must be between 1 and {}, got {}",
            MAX_CONCURRENT_LIMIT, config.max_concurrent
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    validate_file_component("image-extension", &config.image_extension)?;

    Ok(())
}

/// Validates the endpoint URL: must parse and use http or https
pub fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", endpoint, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidUrl(format!(
            "'{}' uses unsupported scheme '{}'",
            endpoint, other
        ))),
    }
}

/// Validates backoff settings
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.network_max_attempts < 1 {
        return Err(ConfigError::Validation(
            "network-max-attempts must be >= 1".to_string(),
        ));
    }

    for (name, base) in [
        ("network-base-delay-ms", config.network_base_delay_ms),
        ("duplicate-base-delay-ms", config.duplicate_base_delay_ms),
    ] {
        if base > config.max_delay_ms {
            return Err(ConfigError::Validation(format!(
                "{} ({}ms) cannot exceed max-delay-ms ({}ms)",
                name, base, config.max_delay_ms
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    validate_file_component("registry-file", &config.registry_file)
}

/// Checks that a value can be used as a single path component
fn validate_file_component(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }

    if value.contains('/') || value.contains('\\') || value == "." || value == ".." {
        return Err(ConfigError::Validation(format!(
            "{} must be a plain file name, got '{}'",
            field, value
        )));
    }

    Ok(())
}
