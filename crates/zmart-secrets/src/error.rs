//! Error types for the credential store.

use thiserror::Error;

/// Errors that can occur during credential store operations.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Not authenticated: unlock the vault first")]
    NotAuthenticated,

    #[error("Vault is already initialized")]
    AlreadyInitialized,

    #[error("Invalid KDF parameters: {0}")]
    InvalidKdf(String),

    #[error("Failed to initialize storage: {0}")]
    StorageInit(String),

    #[error("Failed to write storage: {0}")]
    StorageWrite(String),

    #[error("Failed to read storage: {0}")]
    StorageRead(String),

    #[error("Encryption failed: {0}")]
    Encrypt(String),

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("Credential not found: {0}")]
    NotFound(String),

    #[error("Invalid entry name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result alias for credential store operations.
pub type Result<T> = std::result::Result<T, SecretError>;
