//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Iteration count used for new vaults unless configured otherwise.
pub const DEFAULT_KDF_ITERATIONS: u32 = 100_000;

/// Lowest iteration count the config accepts.
pub const MIN_KDF_ITERATIONS: u32 = 1_000;

/// Highest iteration count accepted from config or from a stored vault.
pub const MAX_KDF_ITERATIONS: u32 = 10_000_000;

/// Main Zmart configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Credential vault settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Credential vault configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Directory holding the persisted vault entries. Defaults to `~/.zmart/vault`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// PBKDF2 iteration count for newly initialized vaults.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Derive keys with the fixed application salt and 1000 iterations.
    ///
    /// Only needed to produce vaults readable by older deployments.
    #[serde(default)]
    pub legacy_kdf: bool,
}

fn default_kdf_iterations() -> u32 {
    DEFAULT_KDF_ITERATIONS
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            dir: None,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            legacy_kdf: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
