//! Persistent key-value backends.
//!
//! The store only ever needs three named string entries, so the backend
//! contract is a plain get/set/remove over names. [`MemoryStorage`] keeps
//! them in process; [`FileStorage`] writes one file per entry with atomic
//! replace semantics.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, SecretError};

/// Maximum allowed length for an entry name.
const MAX_NAME_LEN: usize = 128;

/// Key-value storage backing a [`crate::SecretStore`].
pub trait KeyValueStorage: Send + Sync {
    /// Read an entry. A missing entry is `Ok(None)`, not an error.
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Create or replace an entry. Readers see either the old or the new value.
    fn set(&self, name: &str, value: &str) -> Result<()>;

    /// Delete an entry. Deleting a missing entry succeeds.
    fn remove(&self, name: &str) -> Result<()>;
}

/// In-process storage, the stand-in for browser local storage in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.entries.lock().remove(name);
        Ok(())
    }
}

/// A file-system-backed storage.
///
/// Each entry is stored as `{base_dir}/{name}`. The directory is created with
/// mode `0700` and files with `0600` on Unix.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// Create a storage rooted at `base_dir`. Nothing is touched on disk until
    /// the first write.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Directory holding the entries.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Ensure the base directory exists with restrictive permissions.
    fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&self.base_dir, perms)?;
        }

        Ok(())
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

/// Validate that an entry name contains only safe characters.
///
/// Allowed: ASCII alphanumeric, underscore, hyphen. Max length 128.
fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SecretError::InvalidName(
            "name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(SecretError::InvalidName(format!(
            "name exceeds maximum length of {MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(SecretError::InvalidName(format!(
            "name contains invalid characters (allowed: alphanumeric, underscore, hyphen): {name}"
        )));
    }
    Ok(())
}

/// Write `data` to a sibling temp file with mode 0600, then rename it over `path`.
///
/// The temp file is removed if any step fails.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let result =
        write_private(&temp_path, data).and_then(|()| std::fs::rename(&temp_path, path));
    if let Err(e) = result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}

fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

impl KeyValueStorage for FileStorage {
    fn get(&self, name: &str) -> Result<Option<String>> {
        validate_name(name)?;

        match std::fs::read_to_string(self.entry_path(name)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, name: &str, value: &str) -> Result<()> {
        validate_name(name)?;
        self.ensure_dir()?;

        let path = self.entry_path(name);
        debug!(name, path = %path.display(), "writing entry");
        write_atomic(&path, value.as_bytes())
    }

    fn remove(&self, name: &str) -> Result<()> {
        validate_name(name)?;

        let path = self.entry_path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(name, path = %path.display(), "removed entry");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
