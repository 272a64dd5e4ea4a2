//! # Basket Client
//!
//! Device-scoped cart and wishlist for a storefront, kept in sync with the
//! backend when it is reachable and served from device-local storage when
//! it is not.
//!
//! ## Behaviour
//!
//! - A device without storage (a server render) reports the device id
//!   `"server"`; its operations never touch the network and nothing is
//!   persisted.
//! - An identified device calls the backend first. A successful response
//!   replaces the local cache. A failed call, a non-2xx status or an
//!   undecodable body applies the same change to the local cache instead.
//! - Operations never return errors.
//! - Responses that settle after a newer operation on the same resource are
//!   discarded.
//!
//! ```no_run
//! use basket_client::{Basket, Config};
//! use rust_decimal::Decimal;
//!
//! # async fn run() -> Result<(), basket_client::ClientError> {
//! let basket = Basket::from_config(&Config::new("http://localhost:4000"))?;
//! let cart = basket
//!     .cart()
//!     .add_to_cart("p1", "Ring", Decimal::from(500), "/img.png", 2)
//!     .await;
//! assert_eq!(cart.items[0].quantity, 2);
//! # Ok(())
//! # }
//! ```

pub mod cart;
pub mod catalog;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod events;
pub mod remote;
pub mod storage;
pub mod wishlist;

pub use cart::CartSync;
pub use catalog::{Category, CategoryLookup};
pub use config::{Config, ConfigError};
pub use context::SyncContext;
pub use device::{DeviceIdentity, SERVER_DEVICE_ID};
pub use error::ClientError;
pub use events::{ChangeEvent, EventReceiver, Subscribers};
pub use remote::{RemoteError, RemoteStore};
pub use storage::{FileStorage, KeyValueStorage, LocalStore, MemoryStorage, NoStorage};
pub use wishlist::WishlistSync;

use std::sync::Arc;

/// Cart, wishlist and category services for one device.
#[derive(Debug, Clone)]
pub struct Basket {
    ctx: Arc<SyncContext>,
    cart: CartSync,
    wishlist: WishlistSync,
    categories: Arc<CategoryLookup>,
}

impl Basket {
    /// Build services over file storage at `config.storage_path`.
    pub fn from_config(config: &Config) -> error::Result<Self> {
        let storage = Arc::new(FileStorage::new(&config.storage_path));
        Self::with_storage(config, storage)
    }

    /// Build services over any storage backend.
    pub fn with_storage(
        config: &Config,
        storage: Arc<dyn KeyValueStorage>,
    ) -> error::Result<Self> {
        let local = LocalStore::new(storage);
        let remote = RemoteStore::new(&config.api_url, config.http_timeout)?;
        let identity = DeviceIdentity::new(local.clone());
        let categories = CategoryLookup::new(remote.clone(), identity.clone(), config.category_ttl);
        let ctx = Arc::new(SyncContext::new(
            identity,
            local,
            remote,
            Subscribers::new_shared(),
        ));

        Ok(Self {
            cart: CartSync::new(ctx.clone()),
            wishlist: WishlistSync::new(ctx.clone()),
            categories: Arc::new(categories),
            ctx,
        })
    }

    pub fn cart(&self) -> &CartSync {
        &self.cart
    }

    pub fn wishlist(&self) -> &WishlistSync {
        &self.wishlist
    }

    pub fn categories(&self) -> &CategoryLookup {
        &self.categories
    }

    /// The current device id (generated on first use).
    pub fn device_id(&self) -> String {
        self.ctx.identity.device_id()
    }

    /// Subscribe to cart and wishlist changes.
    pub fn subscribe(&self) -> (String, EventReceiver) {
        self.ctx.subscribers.subscribe()
    }

    pub fn unsubscribe(&self, id: &str) -> bool {
        self.ctx.subscribers.unsubscribe(id)
    }

    pub fn local(&self) -> &LocalStore {
        &self.ctx.local
    }
}
