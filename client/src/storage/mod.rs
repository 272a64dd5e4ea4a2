//! Device-local key-value persistence.
//!
//! [`KeyValueStorage`] is the raw string store (memory, a JSON file on disk,
//! or nothing at all). [`LocalStore`] layers typed JSON access on top and
//! never fails: reads fall back to a default and writes that cannot be
//! persisted are logged and dropped.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Key under which the device identifier is stored.
pub const DEVICE_ID_KEY: &str = "deviceId";

/// Storage key for a device's cart.
pub fn cart_key(device_id: &str) -> String {
    format!("cart:{device_id}")
}

/// Storage key for a device's wishlist.
pub fn wishlist_key(device_id: &str) -> String {
    format!("wishlist:{device_id}")
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is not available in this context")]
    Unavailable,

    #[error("storage quota exceeded writing {key}: {needed} bytes over a {limit} byte limit")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A string key-value store with the semantics of browser local storage.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;

    /// Whether the store can be used at all.
    fn is_available(&self) -> bool {
        true
    }
}

/// Storage for contexts without a device, such as a server render.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStorage;

impl KeyValueStorage for NoStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn clear(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Typed JSON access to a [`KeyValueStorage`].
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueStorage>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn KeyValueStorage>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStorage> {
        &self.backend
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Read and decode `key`, or return `fallback` when the key is absent,
    /// the value does not decode, or storage is unavailable.
    pub fn get_local<T: DeserializeOwned>(&self, key: &str, fallback: T) -> T {
        match self.backend.get_item(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(key, error = %e, "Discarding undecodable local value");
                    fallback
                }
            },
            Ok(None) => fallback,
            Err(e) => {
                tracing::debug!(key, error = %e, "Local read unavailable");
                fallback
            }
        }
    }

    /// Encode and write `value` under `key`. Returns whether it was
    /// persisted; failures are logged, never raised.
    pub fn set_local<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to encode local value");
                return false;
            }
        };

        match self.backend.set_item(key, &raw) {
            Ok(()) => true,
            Err(StorageError::Unavailable) => false,
            Err(e) => {
                tracing::warn!(key, error = %e, "Local write dropped");
                false
            }
        }
    }

    /// Remove `key`. Failures are logged, never raised.
    pub fn remove_local(&self, key: &str) -> bool {
        match self.backend.remove_item(key) {
            Ok(()) => true,
            Err(StorageError::Unavailable) => false,
            Err(e) => {
                tracing::warn!(key, error = %e, "Local remove dropped");
                false
            }
        }
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("available", &self.is_available())
            .finish()
    }
}
