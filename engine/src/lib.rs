//! # Basket Engine
//!
//! Deterministic cart and wishlist state for a storefront that keeps
//! working when its backend does not.
//!
//! This crate holds the rules the device applies on its own: how a cart
//! changes when a product is added or removed, how totals are derived, how
//! backend payloads are decoded, and how late responses are kept from
//! overwriting newer state.
//!
//! ## Design Principles
//!
//! - **No IO**: storage and network live in `basket-client`
//! - **Deterministic**: same inputs, same cart
//! - **Testable**: time is injected through [`cache::Clock`]
//!
//! ## Core Concepts
//!
//! ### Carts and wishlists
//!
//! A [`Cart`] built locally always satisfies `total = Σ price × quantity`.
//! A cart decoded with [`transform::cart_from_response`] keeps the total the
//! backend computed, which may include taxes or discounts.
//!
//! Lines are addressed by line id *or* product id: a line created offline
//! uses its product id as its id, a synced line uses the backend's id.
//!
//! ### Sequence gate
//!
//! The [`SequenceGate`] stamps each mutation with a [`LogicalClock`] tick
//! and admits a settled result only if nothing newer was already applied to
//! the same resource.
//!
//! ### Optimistic transactions
//!
//! [`Optimistic`] snapshots state, applies a change, and is settled by
//! committing the authoritative value or rolling back.
//!
//! ## Quick Start
//!
//! ```rust
//! use basket_engine::{Cart, Optimistic, SequenceGate};
//! use rust_decimal::Decimal;
//!
//! let mut gate = SequenceGate::new("device_1");
//! let stamp = gate.issue();
//!
//! let tx = Optimistic::apply(&Cart::empty(), |cart| {
//!     cart.add("p1", "Ring", Decimal::from(500), "/img.png", 2);
//! });
//! assert_eq!(tx.optimistic().total, Decimal::from(1000));
//!
//! // the backend was unreachable: keep the optimistic cart
//! assert!(gate.admit("cart", &stamp));
//! let cart = tx.commit(None);
//! assert_eq!(cart.items[0].quantity, 2);
//! ```

pub mod cache;
pub mod cart;
pub mod clock;
pub mod error;
pub mod transaction;
pub mod transform;
pub mod wishlist;

// Re-export main types at crate root
pub use cache::{Clock, ManualClock, SystemClock, TtlCache};
pub use cart::{Cart, CartItem};
pub use clock::{LogicalClock, SequenceGate};
pub use error::Error;
pub use transaction::Optimistic;
pub use transform::{cart_from_response, wishlist_from_response};
pub use wishlist::{Wishlist, WishlistItem};

/// Type aliases for clarity
pub type ItemId = String;
pub type ProductId = String;
pub type NodeId = String;
pub type Timestamp = u64;

/// Resource key for cart state in the sequence gate.
pub const CART_RESOURCE: &str = "cart";
/// Resource key for wishlist state in the sequence gate.
pub const WISHLIST_RESOURCE: &str = "wishlist";
