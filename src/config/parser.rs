use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Keys missing from the file take their defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use fake_faces::config::load_config;
///
/// let config = load_config(Path::new("faces.toml")).unwrap();
/// println!("Concurrency: {}", config.download.max_concurrent);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

impl Config {
    /// Computes a SHA-256 fingerprint of the effective configuration
    ///
    /// Recorded with each run so the run history shows which settings
    /// produced which images.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Hex-encoded SHA-256 of the serialized configuration
    /// * `Err(ConfigError)` - The configuration could not be serialized
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let serialized = toml::to_string(self)?;
        let mut hasher = Sha256::new();
        hasher.update(serialized.as_bytes());
        Ok(hex::encode(hasher.finalize()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[download]
endpoint = "https://faces.example.com/"
max-concurrent = 8
request-timeout-secs = 30

[retry]
network-max-attempts = 5
max-delay-ms = 10000

[output]
registry-file = "seen.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.download.endpoint, "https://faces.example.com/");
        assert_eq!(config.download.max_concurrent, 8);
        assert_eq!(config.download.request_timeout_secs, 30);
        assert_eq!(config.download.image_extension, "jpg");
        assert_eq!(config.retry.network_max_attempts, 5);
        assert_eq!(config.retry.duplicate_base_delay_ms, 1_000);
        assert_eq!(config.output.registry_file, "seen.db");
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.download.max_concurrent, 50);
        assert_eq!(config.download.request_timeout_secs, 120);
        assert_eq!(config.retry.network_max_attempts, 3);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/faces.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[download]\nmax-concurrent = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_fingerprint() {
        let config = Config::default();
        let hash1 = config.fingerprint().unwrap();
        let hash2 = config.fingerprint().unwrap();
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);

        let mut other = Config::default();
        other.download.max_concurrent = 7;
        assert_ne!(hash1, other.fingerprint().unwrap());
    }
}
