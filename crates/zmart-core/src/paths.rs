//! Path resolution utilities.

use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the Zmart base directory (~/.zmart).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".zmart"))
}

/// Get the main config file path (~/.zmart/zmart.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("zmart.json5"))
}

/// Get the default vault directory (~/.zmart/vault).
pub fn vault_dir() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("vault"))
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
