//! Configuration loading and persistence.

use super::{Config, MAX_KDF_ITERATIONS, MIN_KDF_ITERATIONS};
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Load from `path` (or the default location), falling back to defaults
    /// when the file does not exist. Environment overrides are applied last.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let loaded = match path {
            Some(p) => Self::load(p),
            None => Self::load_default(),
        };

        let mut config = match loaded {
            Ok(config) => config,
            Err(ConfigError::NotFound(p)) => {
                tracing::debug!(path = %p.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };

        config.apply_env();
        Ok(config)
    }

    /// Apply `ZMART_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Some(dir) = env::get_var(env::VAULT_DIR_VAR) {
            self.vault.dir = Some(PathBuf::from(dir));
        }
        if let Some(iterations) = env::get_u32(env::KDF_ITERATIONS_VAR) {
            self.vault.kdf_iterations = iterations;
        }
        if env::get_bool(env::LEGACY_KDF_VAR) {
            self.vault.legacy_kdf = true;
        }
    }

    /// Save configuration to the default path.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = paths::config_file()?;
        self.save(&path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the vault directory, expanding `~` and falling back to `~/.zmart/vault`.
    pub fn vault_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.vault.dir {
            Some(dir) => Ok(paths::expand_tilde(&dir.to_string_lossy())),
            None => paths::vault_dir(),
        }
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !(MIN_KDF_ITERATIONS..=MAX_KDF_ITERATIONS).contains(&self.vault.kdf_iterations) {
            errors.push(format!(
                "vault.kdf_iterations must be between {} and {}, got {}",
                MIN_KDF_ITERATIONS, MAX_KDF_ITERATIONS, self.vault.kdf_iterations
            ));
        }

        if let Some(dir) = &self.vault.dir {
            if dir.as_os_str().is_empty() {
                errors.push("vault.dir must not be empty".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}
