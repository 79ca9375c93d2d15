//! Cryptographic primitives for the credential store.
//!
//! - Password verifier: SHA-256 hex digest, compared in constant time.
//! - Key derivation: PBKDF2-HMAC-SHA256 producing a 256-bit key.
//! - List blob ([`seal`] / [`open`]): AES-256-GCM under a per-write key derived
//!   with HKDF-SHA256 from a random salt. The nonce is prepended to the
//!   ciphertext so callers only keep track of (ciphertext, salt).
//! - Explicit-IV payloads ([`encrypt_cbc`] / [`decrypt_cbc`]): AES-256-CBC with
//!   PKCS7 padding and a random 128-bit IV, authenticated with HMAC-SHA256.
//! - Legacy list blobs ([`open_openssl`]): read-only support for OpenSSL
//!   `Salted__` data (AES-256-CBC, key and IV from EVP_BytesToKey with MD5), as
//!   written by browser vaults that used the hex key string as a passphrase.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{Result, SecretError};
use crate::types::EncryptedPayload;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

pub const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const SALT_SIZE: usize = 32;
const IV_SIZE: usize = 16;
const KDF_SALT_SIZE: usize = 16;

/// Fixed salt shared by vaults created before per-installation salts.
pub const LEGACY_SALT: &str = "ZmartTrading2024SecureSalt";

/// Iteration count paired with [`LEGACY_SALT`].
pub const LEGACY_ITERATIONS: u32 = 1_000;

/// Base64 prefix of every OpenSSL `Salted__` blob.
pub const OPENSSL_PREFIX: &str = "U2FsdGVkX1";

const OPENSSL_MAGIC: &[u8] = b"Salted__";
const OPENSSL_SALT_SIZE: usize = 8;

/// HKDF info string for list blob keys.
const BLOB_INFO: &[u8] = b"zmart-credentials-v1";

/// HKDF info string for the explicit-IV payload MAC key.
const PAYLOAD_MAC_INFO: &[u8] = b"zmart-payload-mac-v1";

/// A 256-bit symmetric key, wiped on drop.
pub type EncryptionKey = Zeroizing<[u8; KEY_SIZE]>;

/// PBKDF2 parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    pub salt: Vec<u8>,
    pub iterations: u32,
}

impl KdfParams {
    /// Fixed salt and 1000 iterations used by vaults without a KDF entry.
    pub fn legacy() -> Self {
        Self {
            salt: LEGACY_SALT.as_bytes().to_vec(),
            iterations: LEGACY_ITERATIONS,
        }
    }

    /// Fresh random salt with the given iteration count.
    pub fn generate(iterations: u32) -> Self {
        let mut salt = vec![0u8; KDF_SALT_SIZE];
        rand::thread_rng().fill_bytes(&mut salt);
        Self { salt, iterations }
    }
}

/// SHA-256 of the UTF-8 password bytes, lowercase hex.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Check `password` against a stored [`hash_password`] digest in constant time.
pub fn verify_password_hash(password: &str, stored_hash: &str) -> bool {
    let candidate = hash_password(password);
    let stored = stored_hash.trim().to_ascii_lowercase();
    candidate.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Derive the 256-bit encryption key from `password` with PBKDF2-HMAC-SHA256.
pub fn derive_key(password: &str, params: &KdfParams) -> EncryptionKey {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2::pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        &params.salt,
        params.iterations,
        &mut key[..],
    );
    key
}

/// Expand `ikm` into a 256-bit subkey via HKDF-SHA256.
fn hkdf_expand(ikm: &[u8], salt: Option<&[u8]>, info: &[u8]) -> Result<EncryptionKey> {
    let hk = Hkdf::<Sha256>::new(salt, ikm);
    let mut okm = Zeroizing::new([0u8; KEY_SIZE]);
    hk.expand(info, &mut okm[..])
        .map_err(|e| SecretError::Encrypt(format!("HKDF expand failed: {e}")))?;
    Ok(okm)
}

/// Encrypt `plaintext` for the list blob.
///
/// Returns `(nonce || ciphertext_with_tag, salt)`. The salt is randomly
/// generated so the same plaintext encrypted twice produces different output.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut salt = vec![0u8; SALT_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let blob_key = hkdf_expand(key, Some(&salt), BLOB_INFO)?;
    let cipher = Aes256Gcm::new_from_slice(&blob_key[..])
        .map_err(|e| SecretError::Encrypt(e.to_string()))?;

    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| SecretError::Encrypt(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok((result, salt))
}

/// Decrypt data previously produced by [`seal`].
pub fn open(key: &[u8], sealed: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE {
        return Err(SecretError::Decrypt("ciphertext too short".to_string()));
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);

    let blob_key = hkdf_expand(key, Some(salt), BLOB_INFO)
        .map_err(|e| SecretError::Decrypt(e.to_string()))?;
    let cipher = Aes256Gcm::new_from_slice(&blob_key[..])
        .map_err(|e| SecretError::Decrypt(e.to_string()))?;

    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| SecretError::Decrypt(e.to_string()))
}

fn payload_mac(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<HmacSha256> {
    let mac_key = hkdf_expand(key, None, PAYLOAD_MAC_INFO)?;
    let mut mac = <HmacSha256 as Mac>::new_from_slice(&mac_key[..])
        .map_err(|e| SecretError::Encrypt(e.to_string()))?;
    mac.update(iv);
    mac.update(ciphertext);
    Ok(mac)
}

/// Encrypt `plaintext` with AES-256-CBC/PKCS7 under a fresh random IV.
pub fn encrypt_cbc(key: &[u8], plaintext: &[u8]) -> Result<EncryptedPayload> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|e| SecretError::Encrypt(e.to_string()))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let tag = payload_mac(key, &iv, &ciphertext)?.finalize().into_bytes();

    Ok(EncryptedPayload {
        iv: hex::encode(iv),
        ciphertext: STANDARD.encode(&ciphertext),
        mac: hex::encode(tag),
    })
}

/// Decrypt a payload produced by [`encrypt_cbc`].
///
/// The tag is checked before any decryption, so a wrong key or any altered
/// byte of IV or ciphertext fails with [`SecretError::Decrypt`].
pub fn decrypt_cbc(key: &[u8], payload: &EncryptedPayload) -> Result<Vec<u8>> {
    let iv = hex::decode(&payload.iv)
        .map_err(|e| SecretError::Decrypt(format!("invalid IV hex: {e}")))?;
    if iv.len() != IV_SIZE {
        return Err(SecretError::Decrypt(format!(
            "IV must be {IV_SIZE} bytes, got {}",
            iv.len()
        )));
    }
    let ciphertext = STANDARD
        .decode(&payload.ciphertext)
        .map_err(|e| SecretError::Decrypt(format!("base64 decode failed: {e}")))?;
    let tag = hex::decode(&payload.mac)
        .map_err(|e| SecretError::Decrypt(format!("invalid MAC hex: {e}")))?;

    payload_mac(key, &iv, &ciphertext)
        .map_err(|e| SecretError::Decrypt(e.to_string()))?
        .verify_slice(&tag)
        .map_err(|_| SecretError::Decrypt("authentication failed".to_string()))?;

    Aes256CbcDec::new_from_slices(key, &iv)
        .map_err(|e| SecretError::Decrypt(e.to_string()))?
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|e| SecretError::Decrypt(format!("bad padding: {e}")))
}

/// OpenSSL EVP_BytesToKey with MD5 and a single round: 32 key bytes, 16 IV bytes.
fn evp_bytes_to_key(passphrase: &[u8], salt: &[u8]) -> (EncryptionKey, [u8; IV_SIZE]) {
    let mut derived = Zeroizing::new(Vec::with_capacity(KEY_SIZE + IV_SIZE));
    let mut block: Vec<u8> = Vec::new();

    while derived.len() < KEY_SIZE + IV_SIZE {
        let mut input =
            Zeroizing::new(Vec::with_capacity(block.len() + passphrase.len() + salt.len()));
        input.extend_from_slice(&block);
        input.extend_from_slice(passphrase);
        input.extend_from_slice(salt);
        block = md5::compute(&input[..]).0.to_vec();
        derived.extend_from_slice(&block);
    }

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    key.copy_from_slice(&derived[..KEY_SIZE]);
    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&derived[KEY_SIZE..KEY_SIZE + IV_SIZE]);
    (key, iv)
}

/// Decrypt a base64 OpenSSL `Salted__` blob encrypted under `passphrase`.
///
/// The format carries no MAC, so a wrong passphrase is only caught by the
/// padding check or by the caller failing to parse the plaintext.
pub fn open_openssl(passphrase: &[u8], encoded: &str) -> Result<Vec<u8>> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| SecretError::Decrypt(format!("base64 decode failed: {e}")))?;
    let header = OPENSSL_MAGIC.len() + OPENSSL_SALT_SIZE;
    if raw.len() <= header || !raw.starts_with(OPENSSL_MAGIC) {
        return Err(SecretError::Decrypt("not an OpenSSL salted blob".to_string()));
    }

    let (key, iv) = evp_bytes_to_key(passphrase, &raw[OPENSSL_MAGIC.len()..header]);
    Aes256CbcDec::new_from_slices(&key[..], &iv)
        .map_err(|e| SecretError::Decrypt(e.to_string()))?
        .decrypt_padded_vec_mut::<Pkcs7>(&raw[header..])
        .map_err(|e| SecretError::Decrypt(format!("bad padding: {e}")))
}
