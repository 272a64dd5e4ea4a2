//! Wishlist types and local mutation rules.

use crate::{ItemId, ProductId};
use serde::{Deserialize, Serialize};

/// A saved product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: ItemId,
    pub product_id: ProductId,
    pub title: String,
    /// Display string, not used for arithmetic
    pub price: String,
    pub image: String,
}

impl WishlistItem {
    /// Create a local-only entry whose id is the product id.
    pub fn new(
        product_id: impl Into<ProductId>,
        title: impl Into<String>,
        price: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        let product_id = product_id.into();
        Self {
            id: product_id.clone(),
            product_id,
            title: title.into(),
            price: price.into(),
            image: image.into(),
        }
    }

    pub fn matches(&self, identifier: &str) -> bool {
        self.id == identifier || self.product_id == identifier
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    pub items: Vec<WishlistItem>,
}

impl Wishlist {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains_product(&self, product_id: &str) -> bool {
        self.items.iter().any(|item| item.product_id == product_id)
    }

    /// Append an entry unless its product is already present.
    ///
    /// Returns whether the entry was inserted.
    pub fn add(&mut self, item: WishlistItem) -> bool {
        if self.contains_product(&item.product_id) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove the first entry matching by id or product id.
    pub fn remove(&mut self, identifier: &str) -> bool {
        let Some(index) = self.items.iter().position(|item| item.matches(identifier)) else {
            return false;
        };
        self.items.remove(index);
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
