//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::BallotConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<BallotConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: BallotConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load the file if one is given, otherwise validate and use the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<BallotConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = BallotConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network]\nname = \"sepolia\"\nconfirmation_blocks = 2").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.network.name, "sepolia");
        assert_eq!(config.network.confirmation_blocks, 2);
    }

    #[test]
    fn test_validation_error_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[network]\nconfirmation_blocks = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("network.confirmation_blocks"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("does-not-exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config.network.rpc_url, "http://localhost:8545");
    }
}
