//! The password-gated credential store.
//!
//! [`SecretStore`] keeps three independent entries in a [`KeyValueStorage`]:
//! the password verifier, the KDF parameters, and one encrypted blob holding
//! the whole credential list. The encryption key lives only in memory, and only
//! after [`SecretStore::initialize`] or a successful
//! [`SecretStore::verify_password`].

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use zeroize::Zeroizing;
use zmart_core::config::{
    VaultConfig, DEFAULT_KDF_ITERATIONS, MAX_KDF_ITERATIONS, MIN_KDF_ITERATIONS,
};

use crate::crypto::{self, EncryptionKey, KdfParams};
use crate::error::{Result, SecretError};
use crate::storage::KeyValueStorage;
use crate::types::{Credential, EncryptedPayload, StoreState};

/// Entry holding the SHA-256 hex digest of the password.
pub const PASSWORD_HASH_ENTRY: &str = "zmart_password_hash";

/// Entry holding the encrypted credential list.
pub const CREDENTIALS_ENTRY: &str = "zmart_api_keys";

/// Entry holding the PBKDF2 salt and iteration count.
pub const KDF_ENTRY: &str = "zmart_kdf";

const BLOB_VERSION: u8 = 1;

/// Options applied when a new vault is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// PBKDF2 iterations for a fresh per-installation salt.
    pub kdf_iterations: u32,
    /// Use the fixed legacy salt and iteration count instead.
    pub legacy_kdf: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            legacy_kdf: false,
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &VaultConfig) -> Self {
        Self {
            kdf_iterations: config.kdf_iterations,
            legacy_kdf: config.legacy_kdf,
        }
    }

    fn kdf_params(&self) -> Result<KdfParams> {
        if self.legacy_kdf {
            return Ok(KdfParams::legacy());
        }
        if !iterations_in_range(self.kdf_iterations) {
            return Err(SecretError::InvalidKdf(format!(
                "iterations must be between {MIN_KDF_ITERATIONS} and {MAX_KDF_ITERATIONS}, got {}",
                self.kdf_iterations
            )));
        }
        Ok(KdfParams::generate(self.kdf_iterations))
    }
}

fn iterations_in_range(iterations: u32) -> bool {
    (MIN_KDF_ITERATIONS..=MAX_KDF_ITERATIONS).contains(&iterations)
}

/// On-disk representation of the KDF parameters.
#[derive(Debug, Serialize, Deserialize)]
struct StoredKdf {
    /// PBKDF2 salt, hex-encoded.
    salt: String,
    iterations: u32,
}

/// On-disk representation of the encrypted credential list.
#[derive(Debug, Serialize, Deserialize)]
struct StoredBlob {
    version: u8,
    /// AES-256-GCM `nonce || ciphertext || tag`, base64-encoded.
    encrypted_value: String,
    /// HKDF salt, hex-encoded.
    salt: String,
    saved_at: DateTime<Utc>,
}

/// Password-gated store for a list of [`Credential`]s.
///
/// States: `Uninitialized -> initialize -> Unlocked`,
/// `Locked -> verify_password -> Unlocked`, `Unlocked -> clear -> Locked`.
/// Credential reads and writes require `Unlocked`.
pub struct SecretStore {
    storage: Arc<dyn KeyValueStorage>,
    options: StoreOptions,
    password_hash: Option<String>,
    encryption_key: Option<EncryptionKey>,
}

impl SecretStore {
    /// Open a store over `storage`.
    ///
    /// The store starts `Locked` when a password hash is already persisted and
    /// `Uninitialized` otherwise; it is never unlocked without a password.
    pub fn new(storage: Arc<dyn KeyValueStorage>, options: StoreOptions) -> Result<Self> {
        let password_hash = storage
            .get(PASSWORD_HASH_ENTRY)
            .map_err(|e| SecretError::StorageRead(e.to_string()))?;

        let store = Self {
            storage,
            options,
            password_hash,
            encryption_key: None,
        };
        debug!(state = %store.state(), "opened credential store");
        Ok(store)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StoreState {
        match (&self.password_hash, &self.encryption_key) {
            (_, Some(_)) => StoreState::Unlocked,
            (Some(_), None) => StoreState::Locked,
            (None, None) => StoreState::Uninitialized,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.encryption_key.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.password_hash.is_some()
    }

    /// First-time setup: persist the password verifier and KDF parameters,
    /// derive the key, and make sure an (empty) credential blob exists.
    ///
    /// A credential blob left over from an earlier vault is kept as is. It was
    /// encrypted under a different key, so reads fail with
    /// [`SecretError::Decrypt`] until it is overwritten or the vault is
    /// [`reset`](SecretStore::reset).
    pub fn initialize(&mut self, password: &str) -> Result<()> {
        let existing = self
            .storage
            .get(PASSWORD_HASH_ENTRY)
            .map_err(|e| SecretError::StorageInit(e.to_string()))?;
        if existing.is_some() {
            self.password_hash = existing;
            return Err(SecretError::AlreadyInitialized);
        }

        let params = self.options.kdf_params()?;
        let key = crypto::derive_key(password, &params);
        let password_hash = crypto::hash_password(password);

        let kdf = serde_json::to_string(&StoredKdf {
            salt: hex::encode(&params.salt),
            iterations: params.iterations,
        })?;
        // KDF entry first: a persisted hash must always have its parameters.
        self.storage
            .set(KDF_ENTRY, &kdf)
            .map_err(|e| SecretError::StorageInit(e.to_string()))?;
        self.storage
            .set(PASSWORD_HASH_ENTRY, &password_hash)
            .map_err(|e| SecretError::StorageInit(e.to_string()))?;

        self.password_hash = Some(password_hash);
        self.encryption_key = Some(key);
        debug!(iterations = params.iterations, "initialized credential store");

        let blob = self
            .storage
            .get(CREDENTIALS_ENTRY)
            .map_err(|e| SecretError::StorageInit(e.to_string()))?;
        if blob.is_some() {
            warn!("kept an existing credential blob; it will not decrypt under the new password");
        } else if let Err(e) = self.save_credentials(&[]) {
            self.clear();
            return Err(SecretError::StorageInit(e.to_string()));
        }

        Ok(())
    }

    /// Check `password` against the persisted verifier and unlock on success.
    ///
    /// A mismatch returns `Ok(false)` and leaves the current state untouched;
    /// errors are reserved for storage reads.
    pub fn verify_password(&mut self, password: &str) -> Result<bool> {
        let stored = self
            .storage
            .get(PASSWORD_HASH_ENTRY)
            .map_err(|e| SecretError::StorageRead(e.to_string()))?;

        let Some(stored) = stored else {
            debug!("verify_password called on an uninitialized store");
            self.password_hash = None;
            return Ok(false);
        };

        if !crypto::verify_password_hash(password, &stored) {
            warn!("password verification failed");
            self.password_hash = Some(stored);
            return Ok(false);
        }

        let params = self.load_kdf_params()?;
        self.encryption_key = Some(crypto::derive_key(password, &params));
        self.password_hash = Some(stored);
        debug!("credential store unlocked");
        Ok(true)
    }

    /// KDF parameters recorded at initialization; vaults without the entry
    /// predate it and use the legacy parameters.
    fn load_kdf_params(&self) -> Result<KdfParams> {
        let Some(raw) = self
            .storage
            .get(KDF_ENTRY)
            .map_err(|e| SecretError::StorageRead(e.to_string()))?
        else {
            debug!("no KDF entry, using legacy parameters");
            return Ok(KdfParams::legacy());
        };

        let stored: StoredKdf = serde_json::from_str(&raw)
            .map_err(|e| SecretError::StorageRead(format!("malformed KDF entry: {e}")))?;
        let salt = hex::decode(&stored.salt)
            .map_err(|e| SecretError::StorageRead(format!("malformed KDF salt: {e}")))?;
        if !iterations_in_range(stored.iterations) {
            return Err(SecretError::StorageRead(format!(
                "stored KDF iteration count {} is out of range",
                stored.iterations
            )));
        }

        Ok(KdfParams {
            salt,
            iterations: stored.iterations,
        })
    }

    fn key(&self) -> Result<&EncryptionKey> {
        self.encryption_key
            .as_ref()
            .ok_or(SecretError::NotAuthenticated)
    }

    /// Decrypt and return the full credential list.
    ///
    /// A missing blob is an empty list. A blob that fails to decrypt or parse
    /// is reported as [`SecretError::Decrypt`], never as an empty list.
    /// Blobs in the older OpenSSL `Salted__` format are read too; the next save
    /// rewrites them in the current format.
    pub fn get_credentials(&self) -> Result<Vec<Credential>> {
        let key = self.key()?;

        let Some(raw) = self
            .storage
            .get(CREDENTIALS_ENTRY)
            .map_err(|e| SecretError::StorageRead(e.to_string()))?
        else {
            return Ok(Vec::new());
        };

        read_blob(key, &raw).map_err(|e| {
            error!("stored credentials could not be decrypted: {e}");
            e
        })
    }

    /// Encrypt `credentials` and replace the persisted blob in one write.
    pub fn save_credentials(&self, credentials: &[Credential]) -> Result<()> {
        let key = self.key()?;

        let plaintext = Zeroizing::new(
            serde_json::to_vec(credentials)
                .map_err(|e| SecretError::StorageWrite(e.to_string()))?,
        );
        let (sealed, salt) = crypto::seal(&key[..], &plaintext)
            .map_err(|e| SecretError::StorageWrite(e.to_string()))?;

        let blob = StoredBlob {
            version: BLOB_VERSION,
            encrypted_value: STANDARD.encode(&sealed),
            salt: hex::encode(&salt),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string(&blob)
            .map_err(|e| SecretError::StorageWrite(e.to_string()))?;

        self.storage
            .set(CREDENTIALS_ENTRY, &json)
            .map_err(|e| SecretError::StorageWrite(e.to_string()))?;
        debug!(count = credentials.len(), "saved credentials");
        Ok(())
    }

    /// Append a credential and rewrite the list.
    pub fn add_credential(&self, credential: Credential) -> Result<()> {
        let mut credentials = self.get_credentials()?;
        credentials.push(credential);
        self.save_credentials(&credentials)
    }

    /// Replace the credential at `index` and rewrite the list.
    pub fn update_credential(&self, index: usize, credential: Credential) -> Result<()> {
        let mut credentials = self.get_credentials()?;
        let slot = credentials
            .get_mut(index)
            .ok_or_else(|| SecretError::NotFound(format!("index {index}")))?;
        *slot = credential;
        self.save_credentials(&credentials)
    }

    /// Remove the credential at `index`, rewrite the list, and return it.
    pub fn remove_credential(&self, index: usize) -> Result<Credential> {
        let mut credentials = self.get_credentials()?;
        if index >= credentials.len() {
            return Err(SecretError::NotFound(format!("index {index}")));
        }
        let removed = credentials.remove(index);
        self.save_credentials(&credentials)?;
        Ok(removed)
    }

    /// First credential whose name matches `service`, ignoring case.
    pub fn get_api_key(&self, service: &str) -> Result<Option<Credential>> {
        Ok(self
            .get_credentials()?
            .into_iter()
            .find(|c| c.matches(service)))
    }

    /// Encrypt arbitrary JSON data under a fresh, caller-visible IV.
    pub fn encrypt<T: Serialize>(&self, data: &T) -> Result<EncryptedPayload> {
        let key = self.key()?;
        let plaintext = Zeroizing::new(
            serde_json::to_vec(data).map_err(|e| SecretError::Encrypt(e.to_string()))?,
        );
        crypto::encrypt_cbc(&key[..], &plaintext)
    }

    /// Decrypt a payload produced by [`SecretStore::encrypt`].
    pub fn decrypt<T: DeserializeOwned>(&self, payload: &EncryptedPayload) -> Result<T> {
        let key = self.key()?;
        let plaintext = Zeroizing::new(crypto::decrypt_cbc(&key[..], payload)?);
        serde_json::from_slice(&plaintext)
            .map_err(|e| SecretError::Decrypt(format!("invalid JSON: {e}")))
    }

    /// Lock the store: drop the in-memory key.
    ///
    /// Persisted entries are left alone, so the same password unlocks the same
    /// data again later.
    pub fn clear(&mut self) {
        self.encryption_key = None;
        debug!("credential store locked");
    }

    /// Erase every persisted entry and the in-memory key.
    ///
    /// The blob goes first so a partial failure never leaves a password hash
    /// without its KDF entry.
    pub fn reset(&mut self) -> Result<()> {
        self.encryption_key = None;
        for entry in [CREDENTIALS_ENTRY, KDF_ENTRY, PASSWORD_HASH_ENTRY] {
            self.storage
                .remove(entry)
                .map_err(|e| SecretError::StorageWrite(e.to_string()))?;
        }
        self.password_hash = None;
        warn!("credential store reset, all persisted entries removed");
        Ok(())
    }
}

fn read_blob(key: &EncryptionKey, raw: &str) -> Result<Vec<Credential>> {
    if raw.starts_with(crypto::OPENSSL_PREFIX) {
        return read_openssl_blob(key, raw);
    }

    let blob: StoredBlob = serde_json::from_str(raw)
        .map_err(|e| SecretError::Decrypt(format!("malformed blob: {e}")))?;
    if blob.version != BLOB_VERSION {
        return Err(SecretError::Decrypt(format!(
            "unsupported blob version {}",
            blob.version
        )));
    }

    let sealed = STANDARD
        .decode(&blob.encrypted_value)
        .map_err(|e| SecretError::Decrypt(format!("base64 decode failed: {e}")))?;
    let salt = hex::decode(&blob.salt)
        .map_err(|e| SecretError::Decrypt(format!("hex decode failed: {e}")))?;

    let plaintext = Zeroizing::new(crypto::open(&key[..], &sealed, &salt)?);
    serde_json::from_slice(&plaintext)
        .map_err(|e| SecretError::Decrypt(format!("invalid JSON: {e}")))
}

/// Browser vaults encrypted the list with the hex form of the key as an
/// OpenSSL passphrase.
fn read_openssl_blob(key: &EncryptionKey, raw: &str) -> Result<Vec<Credential>> {
    let passphrase = Zeroizing::new(hex::encode(&key[..]));
    let plaintext = Zeroizing::new(crypto::open_openssl(passphrase.as_bytes(), raw)?);
    debug!("read credential blob in OpenSSL format");
    serde_json::from_slice(&plaintext)
        .map_err(|e| SecretError::Decrypt(format!("invalid JSON: {e}")))
}
