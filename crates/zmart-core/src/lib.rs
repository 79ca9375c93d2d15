//! # zmart-core
//!
//! Shared building blocks for the Zmart credential vault:
//!
//! - **Configuration**: loading, validation, and persistence of `zmart.json5`
//! - **Paths**: resolution of the `~/.zmart` directory tree
//! - **Secrets**: [`SecretString`], a zero-on-drop string with redacted output

pub mod config;
pub mod env;
pub mod error;
pub mod paths;
pub mod secret;

pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use secret::SecretString;
