//! Device identity.
//!
//! A device id scopes the local cart and wishlist and lets the backend
//! correlate a guest session. It is generated once, stored under
//! [`DEVICE_ID_KEY`], and never rotated.

use crate::storage::{LocalStore, StorageError, DEVICE_ID_KEY};
use rand::Rng;

/// Device id reported when no storage exists. Callers skip remote calls
/// and local persistence for it.
pub const SERVER_DEVICE_ID: &str = "server";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random suffix of a generated id.
const RANDOM_LEN: usize = 9;

/// Whether `device_id` names a real device.
pub fn is_identified(device_id: &str) -> bool {
    device_id != SERVER_DEVICE_ID
}

/// Provides the device id from local storage.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    store: LocalStore,
}

impl DeviceIdentity {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Return the stored id, generating and storing one if absent.
    ///
    /// Without storage this is [`SERVER_DEVICE_ID`]. If the new id cannot
    /// be stored it is still returned, and a different one will be
    /// generated on the next call.
    pub fn device_id(&self) -> String {
        if !self.store.is_available() {
            return SERVER_DEVICE_ID.to_string();
        }

        match self.store.backend().get_item(DEVICE_ID_KEY) {
            Ok(Some(id)) if !id.is_empty() => return id,
            Ok(_) => {}
            Err(StorageError::Unavailable) => return SERVER_DEVICE_ID.to_string(),
            Err(e) => tracing::warn!(error = %e, "Failed to read device id"),
        }

        let id = generate_device_id();
        match self.store.backend().set_item(DEVICE_ID_KEY, &id) {
            Ok(()) => tracing::info!(device_id = %id, "Generated device id"),
            Err(e) => {
                tracing::warn!(device_id = %id, error = %e, "Device id not persisted");
            }
        }
        id
    }
}

/// Base36 epoch milliseconds followed by random base36 characters.
pub fn generate_device_id() -> String {
    let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
    let mut rng = rand::rng();

    let mut id = to_base36(millis);
    id.extend((0..RANDOM_LEN).map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())])));
    id
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
