//! Password-gated encrypted credential store for Zmart.
//!
//! Third-party API credentials are kept as one AES-256-GCM encrypted list in
//! a pluggable key-value backend. The key is derived from the user's password
//! with PBKDF2 and held only in memory while the store is unlocked.

pub mod crypto;
pub mod error;
pub mod storage;
pub mod store;
pub mod types;

pub use error::{Result, SecretError};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use store::{SecretStore, StoreOptions};
pub use types::{Credential, EncryptedPayload, StoreState};
