//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{EngineConfig, LOG_LEVELS};
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE: &str = "eqmeta.toml";

/// Loads and validates `eqmeta.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<EngineConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates an `eqmeta.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates configuration values that the type system cannot express.
fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if let Some(bad) = config
        .selection
        .collection_types
        .iter()
        .find(|name| name.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(format!(
            "selection.collection_types contains an empty name ({bad:?})"
        )));
    }
    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "unknown log level '{}'",
            config.log.level
        )));
    }
    Ok(())
}
