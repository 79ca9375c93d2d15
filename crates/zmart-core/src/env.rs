//! Environment variable handling.

use std::env;

/// Overrides the config file location.
pub const CONFIG_VAR: &str = "ZMART_CONFIG";

/// Overrides `vault.dir` from the config file.
pub const VAULT_DIR_VAR: &str = "ZMART_VAULT_DIR";

/// Overrides `vault.kdf_iterations`.
pub const KDF_ITERATIONS_VAR: &str = "ZMART_KDF_ITERATIONS";

/// Overrides `vault.legacy_kdf`.
pub const LEGACY_KDF_VAR: &str = "ZMART_LEGACY_KDF";

/// Supplies the vault password non-interactively.
pub const PASSWORD_VAR: &str = "ZMART_PASSWORD";

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable as a boolean.
pub fn get_bool(name: &str) -> bool {
    get_var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Get an environment variable as a u32.
pub fn get_u32(name: &str) -> Option<u32> {
    get_var(name).and_then(|v| v.parse().ok())
}
