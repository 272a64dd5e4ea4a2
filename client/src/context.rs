//! State shared by the cart and wishlist services.

use crate::device::DeviceIdentity;
use crate::events::{ChangeEvent, Subscribers};
use crate::remote::RemoteStore;
use crate::storage::LocalStore;
use basket_engine::{LogicalClock, SequenceGate};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Collaborators of the sync services plus the sequence gate they share.
///
/// Stamps carry the device id current at construction.
#[derive(Debug)]
pub struct SyncContext {
    pub identity: DeviceIdentity,
    pub local: LocalStore,
    pub remote: RemoteStore,
    pub subscribers: Arc<Subscribers>,
    gate: Mutex<SequenceGate>,
}

impl SyncContext {
    pub fn new(
        identity: DeviceIdentity,
        local: LocalStore,
        remote: RemoteStore,
        subscribers: Arc<Subscribers>,
    ) -> Self {
        let gate = SequenceGate::new(identity.device_id());
        Self {
            identity,
            local,
            remote,
            subscribers,
            gate: Mutex::new(gate),
        }
    }

    /// Stamp a new operation.
    pub fn issue(&self) -> LogicalClock {
        self.gate().issue()
    }

    /// Write `state` under `key` and notify subscribers, unless a newer
    /// operation on `resource` has already settled. Returns the state now
    /// current for the resource.
    pub fn settle<T>(
        &self,
        resource: &str,
        key: &str,
        stamp: &LogicalClock,
        state: T,
        event: impl FnOnce(&T) -> ChangeEvent,
    ) -> T
    where
        T: Serialize + DeserializeOwned,
    {
        // held across the write so admission and storage stay in step
        let mut gate = self.gate();
        if !gate.admit(resource, stamp) {
            drop(gate);
            tracing::debug!(
                resource,
                counter = stamp.counter,
                "Discarding stale result"
            );
            return self.local.get_local(key, state);
        }

        self.write(key, &state, event);
        drop(gate);
        state
    }

    /// Write `state` under `key` and notify subscribers without consulting
    /// the gate. Used for optimistic states that a later settle replaces.
    pub fn write<T: Serialize>(&self, key: &str, state: &T, event: impl FnOnce(&T) -> ChangeEvent) {
        self.local.set_local(key, state);
        self.subscribers.publish(&event(state));
    }

    fn gate(&self) -> MutexGuard<'_, SequenceGate> {
        // the gate holds plain counters; a poisoned lock leaves them valid
        self.gate
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStorage, MemoryStorage, NoStorage, DEVICE_ID_KEY};
    use basket_engine::{Cart, CART_RESOURCE};

    fn context(backend: Arc<dyn KeyValueStorage>) -> SyncContext {
        let local = LocalStore::new(backend);
        SyncContext::new(
            DeviceIdentity::new(local.clone()),
            local,
            RemoteStore::new("http://localhost:4000", None).unwrap(),
            Subscribers::new_shared(),
        )
    }

    fn cart_event(_: &Cart) -> ChangeEvent {
        ChangeEvent::CartChanged {
            device_id: "dev-1".into(),
            item_count: 0,
            total: Default::default(),
        }
    }

    #[test]
    fn stamps_carry_device_id() {
        let backend = Arc::new(MemoryStorage::new());
        backend.set_item(DEVICE_ID_KEY, "dev-1").unwrap();
        let ctx = context(backend);

        let stamp = ctx.issue();
        assert_eq!(stamp.node_id, "dev-1");
        assert_eq!(stamp.counter, 1);
    }

    #[test]
    fn server_context_stamps_as_server() {
        let ctx = context(Arc::new(NoStorage));
        assert_eq!(ctx.issue().node_id, "server");
    }

    #[test]
    fn stale_settle_returns_current_state() {
        let backend = Arc::new(MemoryStorage::new());
        backend.set_item(DEVICE_ID_KEY, "dev-1").unwrap();
        let ctx = context(backend);

        let older = ctx.issue();
        let newer = ctx.issue();
        let mut current = Cart::empty();
        current.add("p1", "Ring", 500.into(), "", 1);

        let settled = ctx.settle(CART_RESOURCE, "cart:dev-1", &newer, current.clone(), cart_event);
        assert_eq!(settled, current);

        let stale = ctx.settle(CART_RESOURCE, "cart:dev-1", &older, Cart::empty(), cart_event);
        assert_eq!(stale, current);
    }
}
