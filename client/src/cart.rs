//! Cart synchronization.
//!
//! Remote first, local fallback. When the device is identified each
//! operation calls the backend and adopts the cart it returns; if the call
//! fails or the payload cannot be decoded, the same change is applied to the
//! last known local cart instead. Callers always get a cart back.

use crate::context::SyncContext;
use crate::device::is_identified;
use crate::error::Result;
use crate::events::ChangeEvent;
use crate::storage::cart_key;
use basket_engine::{cart_from_response, Cart, LogicalClock, Optimistic, CART_RESOURCE};
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;

/// Cart operations for the current device.
#[derive(Debug, Clone)]
pub struct CartSync {
    ctx: Arc<SyncContext>,
}

impl CartSync {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { ctx }
    }

    /// The current cart: the backend's when reachable, otherwise the local
    /// cache, otherwise an empty cart.
    pub async fn fetch_cart(&self) -> Cart {
        let device_id = self.ctx.identity.device_id();
        let key = cart_key(&device_id);

        if !is_identified(&device_id) {
            return self.ctx.local.get_local(&key, Cart::empty());
        }

        let stamp = self.ctx.issue();
        match self.refetch(&device_id).await {
            Ok(cart) => self.settle(&device_id, &stamp, cart),
            Err(e) => {
                tracing::warn!(device_id = %device_id, error = %e, "Cart fetch failed, using local cart");
                self.ctx.local.get_local(&key, Cart::empty())
            }
        }
    }

    /// Add `quantity` of a product. Quantities always accumulate onto an
    /// existing line for the product.
    pub async fn add_to_cart(
        &self,
        product_id: &str,
        name: &str,
        price: Decimal,
        image: &str,
        quantity: u32,
    ) -> Cart {
        let (device_id, stamp, tx) = self.begin(|cart| {
            cart.add(product_id, name, price, image, quantity);
        });

        let remote = if is_identified(&device_id) {
            let response = self
                .ctx
                .remote
                .add_cart_item(&device_id, product_id, quantity)
                .await;
            self.decode(&device_id, "add", response)
        } else {
            None
        };

        self.settle(&device_id, &stamp, tx.commit(remote))
    }

    /// Remove the line whose line id or product id is `item_id`.
    ///
    /// The backend delete is followed by a full refetch.
    pub async fn remove_from_cart(&self, item_id: &str) -> Cart {
        let (device_id, stamp, tx) = self.begin(|cart| {
            cart.remove(item_id);
        });

        let remote = if is_identified(&device_id) {
            match self.ctx.remote.remove_cart_item(&device_id, item_id).await {
                Ok(_) => {
                    let response = self.ctx.remote.fetch_cart(&device_id).await;
                    self.decode(&device_id, "refetch", response)
                }
                Err(e) => {
                    tracing::warn!(device_id = %device_id, item_id, error = %e, "Cart remove failed, applying locally");
                    None
                }
            }
        } else {
            None
        };

        self.settle(&device_id, &stamp, tx.commit(remote))
    }

    /// Set a line's quantity. Locally, zero or less removes the line; the
    /// backend receives the value as given.
    pub async fn update_cart_quantity(&self, item_id: &str, quantity: i64) -> Cart {
        let (device_id, stamp, tx) = self.begin(|cart| {
            cart.set_quantity(item_id, quantity);
        });

        let remote = if is_identified(&device_id) {
            let response = self
                .ctx
                .remote
                .update_cart_item(&device_id, item_id, quantity)
                .await;
            self.decode(&device_id, "update", response)
        } else {
            None
        };

        self.settle(&device_id, &stamp, tx.commit(remote))
    }

    /// Empty the cart. The local cart is cleared before anything else and
    /// always; the backend clear is best effort.
    pub async fn clear_cart(&self) {
        let device_id = self.ctx.identity.device_id();
        let stamp = self.ctx.issue();
        self.settle(&device_id, &stamp, Cart::empty());

        if is_identified(&device_id) {
            if let Err(e) = self.ctx.remote.clear_cart(&device_id).await {
                tracing::warn!(device_id = %device_id, error = %e, "Remote cart clear failed");
            }
        }
    }

    /// Read the local cart, stamp the operation, and publish the optimistic
    /// result of `mutate` right away.
    fn begin(&self, mutate: impl FnOnce(&mut Cart)) -> (String, LogicalClock, Optimistic<Cart>) {
        let device_id = self.ctx.identity.device_id();
        let key = cart_key(&device_id);
        let stamp = self.ctx.issue();

        let current = self.ctx.local.get_local(&key, Cart::empty());
        let tx = Optimistic::apply(&current, mutate);
        self.ctx.write(&key, tx.optimistic(), |cart| cart_event(&device_id, cart));

        (device_id, stamp, tx)
    }

    async fn refetch(&self, device_id: &str) -> Result<Cart> {
        let body = self.ctx.remote.fetch_cart(device_id).await?;
        Ok(cart_from_response(&body)?)
    }

    /// Decode a mutation response; any failure means "use the local rule".
    fn decode(
        &self,
        device_id: &str,
        operation: &str,
        response: std::result::Result<Value, crate::remote::RemoteError>,
    ) -> Option<Cart> {
        let decoded = response
            .map_err(crate::error::ClientError::from)
            .and_then(|body| Ok(cart_from_response(&body)?));

        match decoded {
            Ok(cart) => Some(cart),
            Err(e) => {
                tracing::warn!(device_id = %device_id, operation, error = %e, "Cart sync failed, applying locally");
                None
            }
        }
    }

    fn settle(&self, device_id: &str, stamp: &LogicalClock, cart: Cart) -> Cart {
        self.ctx
            .settle(CART_RESOURCE, &cart_key(device_id), stamp, cart, |cart| {
                cart_event(device_id, cart)
            })
    }
}

fn cart_event(device_id: &str, cart: &Cart) -> ChangeEvent {
    ChangeEvent::CartChanged {
        device_id: device_id.to_string(),
        item_count: cart.item_count(),
        total: cart.total,
    }
}
