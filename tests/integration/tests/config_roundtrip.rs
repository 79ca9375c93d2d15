//! Config save/load roundtrip integration tests.
//!
//! These tests verify that configuration can be serialized, written to disk,
//! and loaded back with identical field values.

use std::path::Path;
use tempfile::TempDir;
use zmart_core::config::{Config, LogFormat, LogLevel};

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zmart.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.vault.kdf_iterations, config.vault.kdf_iterations);
    assert_eq!(loaded.vault.legacy_kdf, config.vault.legacy_kdf);
    assert_eq!(loaded.logging.level, config.logging.level);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zmart.json5");

    let mut config = Config::default();
    config.vault.dir = Some(dir.path().join("vault"));
    config.logging.level = LogLevel::Debug;
    config.logging.format = LogFormat::Json;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.vault.dir, Some(dir.path().join("vault")));
    assert_eq!(loaded.logging.level, LogLevel::Debug);
    assert_eq!(loaded.logging.format, LogFormat::Json);
    assert_eq!(loaded.vault_dir().unwrap(), dir.path().join("vault"));
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/zmart.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    let result = Config::parse("not valid json");
    assert!(result.is_err());
}
