//! CLI command integration tests.
//!
//! Commands run in-process through `zmart_cli::run` against a temporary vault.
//! The password comes from `ZMART_PASSWORD`, so no prompt is involved.

use clap::Parser;
use tempfile::TempDir;
use zmart_cli::{run, Cli};
use zmart_core::env::PASSWORD_VAR;
use zmart_core::Config;
use zmart_integration_tests::{open_store, test_config, TEST_PASSWORD};
use zmart_secrets::StoreState;

async fn zmart(config: &Config, args: &[&str]) -> anyhow::Result<()> {
    std::env::set_var(PASSWORD_VAR, TEST_PASSWORD);
    let cli = Cli::try_parse_from(std::iter::once("zmart").chain(args.iter().copied()))?;
    run(cli, config.clone()).await
}

#[tokio::test]
async fn test_init_then_manage_keys() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    zmart(&config, &["init"]).await.unwrap();
    zmart(
        &config,
        &["keys", "add", "--name", "KuCoin", "--key", "abc123", "--secret", "s3cr3t"],
    )
    .await
    .unwrap();
    zmart(&config, &["keys", "add", "--name", "Cryptometer", "--key", "cm-key"])
        .await
        .unwrap();
    zmart(&config, &["keys", "list"]).await.unwrap();
    zmart(&config, &["keys", "get", "kucoin"]).await.unwrap();
    zmart(&config, &["keys", "update", "1", "--key", "cm-key-2"])
        .await
        .unwrap();
    zmart(&config, &["keys", "remove", "0"]).await.unwrap();

    let mut store = open_store(&config);
    assert!(store.verify_password(TEST_PASSWORD).unwrap());
    let creds = store.get_credentials().unwrap();
    assert_eq!(creds.len(), 1);
    assert_eq!(creds[0].name, "Cryptometer");
    assert_eq!(creds[0].key.expose_secret(), "cm-key-2");
}

#[tokio::test]
async fn test_init_twice_fails() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    zmart(&config, &["init"]).await.unwrap();
    assert!(zmart(&config, &["init"]).await.is_err());
}

#[tokio::test]
async fn test_keys_before_init_fails() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    let err = zmart(&config, &["keys", "list"]).await.unwrap_err();
    assert!(err.to_string().contains("not initialized"));
}

#[tokio::test]
async fn test_get_unknown_key_fails() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    zmart(&config, &["init"]).await.unwrap();
    assert!(zmart(&config, &["keys", "get", "binance"]).await.is_err());
    assert!(zmart(&config, &["keys", "remove", "3"]).await.is_err());
}

#[tokio::test]
async fn test_reset_needs_confirmation() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    zmart(&config, &["init"]).await.unwrap();
    assert!(zmart(&config, &["reset"]).await.is_err());
    assert_eq!(open_store(&config).state(), StoreState::Locked);

    zmart(&config, &["reset", "--yes"]).await.unwrap();
    assert_eq!(open_store(&config).state(), StoreState::Uninitialized);
}

#[tokio::test]
async fn test_status_and_version() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    zmart(&config, &["status"]).await.unwrap();
    zmart(&config, &["version"]).await.unwrap();
}
