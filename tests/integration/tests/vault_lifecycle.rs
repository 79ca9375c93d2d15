//! File-backed vault lifecycle tests.
//!
//! Each test drives a `SecretStore` over a real `FileStorage` directory and,
//! where it matters, reopens the store to simulate a new session.

use std::fs;

use tempfile::TempDir;
use zmart_integration_tests::{open_store, test_config, TEST_PASSWORD};
use zmart_secrets::store::{CREDENTIALS_ENTRY, KDF_ENTRY, PASSWORD_HASH_ENTRY};
use zmart_secrets::{Credential, SecretError, StoreState};

fn kucoin() -> Credential {
    Credential::new("KuCoin", "abc123")
        .with_secret("s3cr3t")
        .with_passphrase("")
}

fn read_entries(dir: &std::path::Path) -> Vec<Vec<u8>> {
    [PASSWORD_HASH_ENTRY, KDF_ENTRY, CREDENTIALS_ENTRY]
        .iter()
        .map(|name| fs::read(dir.join(name)).unwrap())
        .collect()
}

#[test]
fn test_fresh_vault_requires_authentication() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&test_config(tmp.path()));

    assert_eq!(store.state(), StoreState::Uninitialized);
    assert!(matches!(
        store.get_credentials(),
        Err(SecretError::NotAuthenticated)
    ));
}

#[test]
fn test_kucoin_scenario_on_disk() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let mut store = open_store(&config);

    store.initialize(TEST_PASSWORD).unwrap();
    store.save_credentials(&[kucoin()]).unwrap();

    let creds = store.get_credentials().unwrap();
    assert_eq!(creds.len(), 1);
    assert_eq!(creds[0].name, "KuCoin");
    assert_eq!(creds[0].key.expose_secret(), "abc123");

    let on_disk = fs::read_to_string(config.vault_dir().unwrap().join(CREDENTIALS_ENTRY)).unwrap();
    assert!(!on_disk.contains("KuCoin"));
    assert!(!on_disk.contains("abc123"));
}

#[test]
fn test_new_session_unlocks_with_password() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    let list = vec![
        kucoin(),
        Credential::new("Cryptometer", "cm-key"),
    ];
    {
        let mut store = open_store(&config);
        store.initialize(TEST_PASSWORD).unwrap();
        store.save_credentials(&list).unwrap();
    }

    let mut store = open_store(&config);
    assert_eq!(store.state(), StoreState::Locked);
    assert!(matches!(
        store.save_credentials(&[]),
        Err(SecretError::NotAuthenticated)
    ));

    assert!(!store.verify_password("wrong").unwrap());
    assert_eq!(store.state(), StoreState::Locked);

    assert!(store.verify_password(TEST_PASSWORD).unwrap());
    assert_eq!(store.get_credentials().unwrap(), list);
}

#[test]
fn test_clear_leaves_files_untouched() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let dir = config.vault_dir().unwrap();

    let mut store = open_store(&config);
    store.initialize(TEST_PASSWORD).unwrap();
    store.save_credentials(&[kucoin()]).unwrap();

    let before = read_entries(&dir);
    store.clear();
    assert_eq!(read_entries(&dir), before);

    assert!(store.verify_password(TEST_PASSWORD).unwrap());
    assert_eq!(store.get_credentials().unwrap(), vec![kucoin()]);
}

#[test]
fn test_every_save_rewrites_blob() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let path = config.vault_dir().unwrap().join(CREDENTIALS_ENTRY);

    let mut store = open_store(&config);
    store.initialize(TEST_PASSWORD).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    store.add_credential(kucoin()).unwrap();
    let second = fs::read_to_string(&path).unwrap();
    assert_ne!(first, second);

    store.remove_credential(0).unwrap();
    assert!(store.get_credentials().unwrap().is_empty());
}

#[test]
fn test_corrupted_file_reports_decrypt_error() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let path = config.vault_dir().unwrap().join(CREDENTIALS_ENTRY);

    let mut store = open_store(&config);
    store.initialize(TEST_PASSWORD).unwrap();
    store.save_credentials(&[kucoin()]).unwrap();

    let mut blob: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    blob["salt"] = serde_json::Value::String("00".repeat(32));
    fs::write(&path, blob.to_string()).unwrap();

    assert!(matches!(
        store.get_credentials(),
        Err(SecretError::Decrypt(_))
    ));
}

#[test]
fn test_payload_from_one_session_decrypts_in_the_next() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());

    let payload = {
        let mut store = open_store(&config);
        store.initialize(TEST_PASSWORD).unwrap();
        store.encrypt(&vec![kucoin()]).unwrap()
    };

    let mut store = open_store(&config);
    store.verify_password(TEST_PASSWORD).unwrap();
    let back: Vec<Credential> = store.decrypt(&payload).unwrap();
    assert_eq!(back, vec![kucoin()]);

    let mut tampered = payload.clone();
    tampered.mac = "00".repeat(32);
    assert!(matches!(
        store.decrypt::<Vec<Credential>>(&tampered),
        Err(SecretError::Decrypt(_))
    ));
}

#[test]
fn test_reset_removes_files() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path());
    let dir = config.vault_dir().unwrap();

    let mut store = open_store(&config);
    store.initialize(TEST_PASSWORD).unwrap();
    store.reset().unwrap();

    assert!(!dir.join(PASSWORD_HASH_ENTRY).exists());
    assert!(!dir.join(KDF_ENTRY).exists());
    assert!(!dir.join(CREDENTIALS_ENTRY).exists());
    assert_eq!(open_store(&config).state(), StoreState::Uninitialized);
}
