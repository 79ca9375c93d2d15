//! Core types for the credential store.
//!
//! [`Credential`] is the plaintext record callers work with; it only ever
//! reaches storage inside the encrypted list blob. [`EncryptedPayload`] is the
//! caller-visible output of the explicit-IV encryption path.

use serde::{Deserialize, Serialize};
use std::fmt;
use zmart_core::SecretString;

/// One third-party API credential (exchange key, secret, passphrase).
///
/// Identity is positional or by `name`; names are unique only by convention.
/// `Debug` output is safe to log: every field except `name` is a
/// [`SecretString`] and prints as `[REDACTED]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Display label, e.g. "KuCoin".
    pub name: String,

    /// Public API key / identifier.
    pub key: SecretString,

    /// Private secret. Some providers have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<SecretString>,

    /// Additional passphrase, if the provider uses one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<SecretString>,
}

impl Credential {
    /// Create a credential with only a name and key.
    pub fn new(name: impl Into<String>, key: impl Into<SecretString>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            secret: None,
            passphrase: None,
        }
    }

    /// Attach a secret.
    pub fn with_secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Attach a passphrase.
    pub fn with_passphrase(mut self, passphrase: impl Into<SecretString>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    /// Case-insensitive name match.
    pub fn matches(&self, service: &str) -> bool {
        self.name.to_lowercase() == service.to_lowercase()
    }
}

/// Output of [`crate::SecretStore::encrypt`].
///
/// AES-256-CBC/PKCS7 ciphertext with the IV the caller must keep alongside it,
/// plus an HMAC-SHA256 tag over `iv || ciphertext`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// 128-bit IV, hex-encoded.
    pub iv: String,

    /// Ciphertext, base64-encoded.
    pub ciphertext: String,

    /// HMAC-SHA256 tag, hex-encoded.
    pub mac: String,
}

/// Lifecycle state of a [`crate::SecretStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    /// No password hash persisted yet.
    Uninitialized,
    /// Password hash persisted, no key in memory.
    Locked,
    /// Password hash persisted and the encryption key is held in memory.
    Unlocked,
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreState::Uninitialized => "uninitialized",
            StoreState::Locked => "locked",
            StoreState::Unlocked => "unlocked",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_is_redacted() {
        let cred = Credential::new("KuCoin", "abc123")
            .with_secret("s3cr3t")
            .with_passphrase("hunter2");
        let debug = format!("{:?}", cred);

        assert!(debug.contains("KuCoin"));
        assert!(!debug.contains("abc123"));
        assert!(!debug.contains("s3cr3t"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credential_json_shape() {
        let cred = Credential::new("KuCoin", "abc123").with_passphrase("");
        let json = serde_json::to_value(&cred).unwrap();

        assert_eq!(json["name"], "KuCoin");
        assert_eq!(json["key"], "abc123");
        assert_eq!(json["passphrase"], "");
        assert!(json.get("secret").is_none());
    }

    #[test]
    fn test_credential_accepts_browser_records() {
        // Records written by the dashboard always carry every field as a string.
        let json = r#"{"name":"Cryptometer","key":"k","secret":"","passphrase":"","extra":1}"#;
        let cred: Credential = serde_json::from_str(json).unwrap();

        assert_eq!(cred.name, "Cryptometer");
        assert_eq!(cred.secret, Some(SecretString::new("")));
    }

    #[test]
    fn test_credential_matches_case_insensitive() {
        let cred = Credential::new("KuCoin", "abc123");
        assert!(cred.matches("kucoin"));
        assert!(cred.matches("KUCOIN"));
        assert!(!cred.matches("binance"));
    }

    #[test]
    fn test_store_state_display() {
        assert_eq!(StoreState::Uninitialized.to_string(), "uninitialized");
        assert_eq!(StoreState::Locked.to_string(), "locked");
        assert_eq!(StoreState::Unlocked.to_string(), "unlocked");
    }
}
