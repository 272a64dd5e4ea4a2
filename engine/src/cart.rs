//! Cart types and local mutation rules.
//!
//! These rules are what the device applies when the backend cannot be
//! reached. A cart built here always carries `total = Σ price × quantity`;
//! a cart decoded from the backend keeps the backend's own total.

use crate::error::{Error, Result};
use crate::{ItemId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Remote line id when synced, otherwise the product id
    pub id: ItemId,
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    /// Always at least 1 while the line exists
    pub quantity: u32,
    pub image: String,
}

impl CartItem {
    /// Create a local-only line whose id is the product id.
    pub fn new(
        product_id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Decimal,
        image: impl Into<String>,
        quantity: u32,
    ) -> Self {
        let product_id = product_id.into();
        Self {
            id: product_id.clone(),
            product_id,
            name: name.into(),
            price,
            quantity,
            image: image.into(),
        }
    }

    /// Whether `identifier` names this line by line id or product id.
    pub fn matches(&self, identifier: &str) -> bool {
        self.id == identifier || self.product_id == identifier
    }

    /// `price × quantity`, or `None` if it does not fit in a [`Decimal`].
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

/// A cart as seen by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub total: Decimal,
}

impl Default for Cart {
    fn default() -> Self {
        Self::empty()
    }
}

impl Cart {
    /// An empty cart with zero total.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Decimal::ZERO,
        }
    }

    /// Build a cart from lines, computing the total locally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TotalOverflow`] if the total does not fit in a
    /// [`Decimal`].
    pub fn from_items(items: Vec<CartItem>) -> Result<Self> {
        let mut cart = Self {
            items,
            total: Decimal::ZERO,
        };
        cart.total = cart.computed_total().ok_or(Error::TotalOverflow)?;
        Ok(cart)
    }

    /// Build a cart with a total supplied by the backend. The total is
    /// trusted as-is; it may include taxes or discounts.
    pub fn with_total(items: Vec<CartItem>, total: Decimal) -> Self {
        Self { items, total }
    }

    /// `Σ price × quantity` over all lines, or `None` on overflow.
    pub fn computed_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
    }

    /// Sum of quantities, for badge counters. Saturates at `u32::MAX`.
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, item| count.saturating_add(item.quantity))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by line id or product id.
    pub fn find(&self, identifier: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.matches(identifier))
    }

    /// Add `quantity` of a product. Increments an existing line for the
    /// product or appends a new one.
    ///
    /// Returns whether the cart changed. A zero quantity, or a change whose
    /// total would overflow, leaves the cart as it was.
    pub fn add(
        &mut self,
        product_id: &str,
        name: &str,
        price: Decimal,
        image: &str,
        quantity: u32,
    ) -> bool {
        if quantity == 0 {
            return false;
        }

        self.change(|items| {
            match items.iter_mut().find(|item| item.product_id == product_id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
                None => items.push(CartItem::new(product_id, name, price, image, quantity)),
            }
            true
        })
    }

    /// Remove the first line matching `identifier`. Returns whether a line
    /// was removed; removing again is a no-op.
    pub fn remove(&mut self, identifier: &str) -> bool {
        self.change(|items| {
            let Some(index) = items.iter().position(|item| item.matches(identifier)) else {
                return false;
            };
            items.remove(index);
            true
        })
    }

    /// Set a line's quantity. Zero or negative removes the line; an unknown
    /// identifier or an overflowing total changes nothing.
    pub fn set_quantity(&mut self, identifier: &str, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(identifier);
        }

        self.change(|items| {
            let Some(item) = items.iter_mut().find(|item| item.matches(identifier)) else {
                return false;
            };
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
            true
        })
    }

    /// Drop all lines.
    pub fn clear(&mut self) {
        self.items.clear();
        self.total = Decimal::ZERO;
    }

    /// Apply `edit` to the lines and recompute the total. The edit is
    /// undone if it reports no change or the new total overflows.
    fn change(&mut self, edit: impl FnOnce(&mut Vec<CartItem>) -> bool) -> bool {
        let before = self.items.clone();
        if !edit(&mut self.items) {
            return false;
        }

        match self.computed_total() {
            Some(total) => {
                self.total = total;
                true
            }
            None => {
                self.items = before;
                false
            }
        }
    }
}
