//! Shared fixtures for the integration tests.

use std::path::Path;
use std::sync::Arc;

use zmart_core::Config;
use zmart_secrets::{FileStorage, SecretStore, StoreOptions};

/// Password used by every test that goes through `ZMART_PASSWORD`.
pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

/// A config whose vault lives under `dir`, with a cheap KDF.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.vault.dir = Some(dir.join("vault"));
    config.vault.kdf_iterations = 1_000;
    config
}

/// Open a file-backed store for `config`.
pub fn open_store(config: &Config) -> SecretStore {
    let storage = FileStorage::new(config.vault_dir().unwrap());
    SecretStore::new(Arc::new(storage), StoreOptions::from_config(&config.vault)).unwrap()
}
