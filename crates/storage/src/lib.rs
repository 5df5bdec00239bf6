//! Object storage for generated images.
//!
//! [`ObjectStore`] is the seam between the job engine and wherever image
//! bytes actually live. Outputs are persisted via [`ObjectStore::put`],
//! which mints and returns a stable key; edit jobs resolve their reference
//! images back through [`ObjectStore::get`].
//!
//! Three backends: [`LocalObjectStore`] (dev default, writes under a root
//! directory), [`S3ObjectStore`] (production), and [`MemoryObjectStore`]
//! (tests and ephemeral use).

use async_trait::async_trait;

pub mod local;
pub mod memory;
pub mod s3;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No object exists under the given key.
    #[error("No stored image found for key '{0}'")]
    NotFound(String),

    /// The key is syntactically unacceptable (e.g. escapes the store root).
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    /// Filesystem failure from the local backend.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by a remote backend (S3).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Pluggable storage backend for image bytes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist `bytes` and return the minted key referencing them.
    async fn put(&self, bytes: &[u8]) -> Result<String, StorageError>;

    /// Fetch the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove the object stored under `key`. Removing an absent key is an
    /// error so callers can distinguish cleanup bugs from success.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Mint a fresh object key: `images/{yyyymmdd_hhmmss}_{uuid}.png`.
///
/// The timestamp keeps listings browsable; the uuid suffix makes keys from
/// concurrent jobs collision-free.
pub(crate) fn mint_key() -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    format!("images/{stamp}_{}.png", uuid::Uuid::new_v4())
}

/// Reject keys that could escape a backend's namespace.
pub(crate) fn check_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_keys_are_unique_and_namespaced() {
        let a = mint_key();
        let b = mint_key();
        assert_ne!(a, b);
        assert!(a.starts_with("images/"));
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn traversal_keys_are_rejected() {
        assert!(check_key("images/ok.png").is_ok());
        assert!(check_key("../etc/passwd").is_err());
        assert!(check_key("images/../../x").is_err());
        assert!(check_key("/absolute").is_err());
        assert!(check_key("").is_err());
    }
}
