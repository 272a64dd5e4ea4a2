//! Wishlist synchronization.
//!
//! Same remote-first, local-fallback flow as the cart. Duplicate adds are
//! refused locally without a network call; the backend's list is adopted as
//! sent, duplicates included.

use crate::context::SyncContext;
use crate::device::is_identified;
use crate::error::Result;
use crate::events::ChangeEvent;
use crate::storage::wishlist_key;
use basket_engine::{
    wishlist_from_response, LogicalClock, Optimistic, Wishlist, WishlistItem, WISHLIST_RESOURCE,
};
use std::sync::Arc;

/// Wishlist operations for the current device.
#[derive(Debug, Clone)]
pub struct WishlistSync {
    ctx: Arc<SyncContext>,
}

impl WishlistSync {
    pub fn new(ctx: Arc<SyncContext>) -> Self {
        Self { ctx }
    }

    /// The current wishlist, remote first.
    pub async fn get_wishlist(&self) -> Wishlist {
        let device_id = self.ctx.identity.device_id();
        let key = wishlist_key(&device_id);

        if !is_identified(&device_id) {
            return self.ctx.local.get_local(&key, Wishlist::empty());
        }

        let stamp = self.ctx.issue();
        match self.refetch(&device_id).await {
            Ok(wishlist) => self.settle(&device_id, &stamp, wishlist),
            Err(e) => {
                tracing::warn!(device_id = %device_id, error = %e, "Wishlist fetch failed, using local wishlist");
                self.ctx.local.get_local(&key, Wishlist::empty())
            }
        }
    }

    /// Save a product. A product already on the local wishlist is left alone.
    pub async fn add_wishlist_item(&self, item: WishlistItem) -> Wishlist {
        let device_id = self.ctx.identity.device_id();
        let key = wishlist_key(&device_id);

        let current = self.ctx.local.get_local(&key, Wishlist::empty());
        if current.contains_product(&item.product_id) {
            tracing::debug!(device_id = %device_id, product_id = %item.product_id, "Already on wishlist");
            return current;
        }

        let product_id = item.product_id.clone();
        let (stamp, tx) = self.begin(&device_id, &current, |wishlist| {
            wishlist.add(item);
        });

        let remote = if is_identified(&device_id) {
            match self.ctx.remote.add_wishlist_item(&device_id, &product_id).await {
                Ok(body) => wishlist_from_response(&body).ok(),
                Err(e) => {
                    tracing::warn!(device_id = %device_id, product_id = %product_id, error = %e, "Wishlist add failed, applying locally");
                    None
                }
            }
        } else {
            None
        };

        self.settle(&device_id, &stamp, tx.commit(remote))
    }

    /// Remove the entry whose id or product id is `item_id`.
    pub async fn remove_wishlist_item(&self, item_id: &str) -> Wishlist {
        let device_id = self.ctx.identity.device_id();
        let current = self
            .ctx
            .local
            .get_local(&wishlist_key(&device_id), Wishlist::empty());
        let (stamp, tx) = self.begin(&device_id, &current, |wishlist| {
            wishlist.remove(item_id);
        });

        let remote = if is_identified(&device_id) {
            match self.ctx.remote.remove_wishlist_item(&device_id, item_id).await {
                Ok(_) => self.refetch(&device_id).await.ok(),
                Err(e) => {
                    tracing::warn!(device_id = %device_id, item_id, error = %e, "Wishlist remove failed, applying locally");
                    None
                }
            }
        } else {
            None
        };

        self.settle(&device_id, &stamp, tx.commit(remote))
    }

    /// Empty the wishlist locally, then best effort on the backend.
    pub async fn clear_wishlist(&self) {
        let device_id = self.ctx.identity.device_id();
        let stamp = self.ctx.issue();
        self.settle(&device_id, &stamp, Wishlist::empty());

        if is_identified(&device_id) {
            if let Err(e) = self.ctx.remote.clear_wishlist(&device_id).await {
                tracing::warn!(device_id = %device_id, error = %e, "Remote wishlist clear failed");
            }
        }
    }

    fn begin(
        &self,
        device_id: &str,
        current: &Wishlist,
        mutate: impl FnOnce(&mut Wishlist),
    ) -> (LogicalClock, Optimistic<Wishlist>) {
        let stamp = self.ctx.issue();
        let tx = Optimistic::apply(current, mutate);
        self.ctx.write(&wishlist_key(device_id), tx.optimistic(), |wishlist| {
            wishlist_event(device_id, wishlist)
        });
        (stamp, tx)
    }

    async fn refetch(&self, device_id: &str) -> Result<Wishlist> {
        let body = self.ctx.remote.fetch_wishlist(device_id).await?;
        Ok(wishlist_from_response(&body)?)
    }

    fn settle(&self, device_id: &str, stamp: &LogicalClock, wishlist: Wishlist) -> Wishlist {
        self.ctx.settle(
            WISHLIST_RESOURCE,
            &wishlist_key(device_id),
            stamp,
            wishlist,
            |wishlist| wishlist_event(device_id, wishlist),
        )
    }
}

fn wishlist_event(device_id: &str, wishlist: &Wishlist) -> ChangeEvent {
    ChangeEvent::WishlistChanged {
        device_id: device_id.to_string(),
        item_count: wishlist.len(),
    }
}
