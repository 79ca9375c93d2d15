//! Vault lifecycle commands and the shared open/unlock helpers.

use std::sync::Arc;

use anyhow::Context;
use zmart_core::{env, Config, SecretString};
use zmart_secrets::{FileStorage, SecretStore, StoreOptions, StoreState};

/// Open the file-backed store described by `config`. The store starts locked.
pub fn open_store(config: &Config) -> anyhow::Result<SecretStore> {
    let dir = config.vault_dir()?;
    let storage = FileStorage::new(dir);
    SecretStore::new(Arc::new(storage), StoreOptions::from_config(&config.vault))
        .context("Failed to open vault")
}

/// Read a password from `ZMART_PASSWORD` or prompt for it without echo.
pub fn read_password(prompt: &str) -> anyhow::Result<SecretString> {
    if let Some(password) = env::get_var(env::PASSWORD_VAR) {
        return Ok(SecretString::new(password));
    }
    let password = rpassword::prompt_password(prompt).context("Failed to read password")?;
    Ok(SecretString::new(password))
}

/// Unlock `store`, running the key derivation on a blocking worker.
pub async fn unlock(store: SecretStore) -> anyhow::Result<SecretStore> {
    if store.state() == StoreState::Uninitialized {
        anyhow::bail!("Vault is not initialized. Run 'zmart init' first.");
    }

    let password = read_password("Vault password: ")?;
    let (store, verified) = tokio::task::spawn_blocking(move || {
        let mut store = store;
        let verified = store.verify_password(password.expose_secret());
        (store, verified)
    })
    .await?;

    if !verified? {
        anyhow::bail!("Incorrect password");
    }
    Ok(store)
}

/// `zmart init`
pub async fn init(config: &Config) -> anyhow::Result<()> {
    config.validate()?;
    let store = open_store(config)?;
    if store.is_initialized() {
        anyhow::bail!("Vault already exists. Use 'zmart reset --yes' to start over.");
    }

    let password = read_password("New vault password: ")?;
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }
    if env::get_var(env::PASSWORD_VAR).is_none() {
        let confirm = read_password("Confirm password: ")?;
        if confirm != password {
            anyhow::bail!("Passwords do not match");
        }
    }

    tokio::task::spawn_blocking(move || {
        let mut store = store;
        store.initialize(password.expose_secret())
    })
    .await?
    .context("Failed to initialize vault")?;

    println!("Vault initialized at {}", config.vault_dir()?.display());
    Ok(())
}

/// `zmart status`
pub fn status(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    println!("State:     {}", store.state());
    println!("Directory: {}", config.vault_dir()?.display());
    Ok(())
}

/// `zmart reset`
pub fn reset(config: &Config, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("Refusing to erase the vault without --yes");
    }

    let mut store = open_store(config)?;
    if !store.is_initialized() {
        println!("Vault is already empty.");
        return Ok(());
    }

    store.reset().context("Failed to reset vault")?;
    println!("Vault erased. Run 'zmart init' to create a new one.");
    Ok(())
}
