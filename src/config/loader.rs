//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::DemoConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<DemoConfig, ConfigError> {
    let config: DemoConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validated(config)
}

/// Validate a configuration, typically again after CLI flags changed it.
pub fn validated(config: DemoConfig) -> Result<DemoConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<DemoConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Load the file when one is given, otherwise fall back to defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<DemoConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(DemoConfig::default()),
    }
}
