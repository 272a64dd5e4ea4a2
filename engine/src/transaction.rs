//! Optimistic apply / commit / rollback.
//!
//! A mutation snapshots the current state, publishes an optimistic state
//! right away, and later either commits the authoritative result or rolls
//! back to the snapshot.

/// An in-flight optimistic change to a value of type `T`.
///
/// The transaction is consumed by [`commit`](Self::commit) or
/// [`rollback`](Self::rollback), so it cannot be settled twice.
#[derive(Debug, Clone)]
#[must_use = "an optimistic transaction must be committed or rolled back"]
pub struct Optimistic<T> {
    snapshot: T,
    optimistic: T,
}

impl<T: Clone> Optimistic<T> {
    /// Snapshot `current` and apply `mutate` to a copy of it.
    pub fn apply(current: &T, mutate: impl FnOnce(&mut T)) -> Self {
        let snapshot = current.clone();
        let mut optimistic = current.clone();
        mutate(&mut optimistic);
        Self {
            snapshot,
            optimistic,
        }
    }

    /// The state to show while the change is in flight.
    pub fn optimistic(&self) -> &T {
        &self.optimistic
    }

    /// The state before the change.
    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }

    /// Settle with the authoritative value, or keep the optimistic one.
    pub fn commit(self, authoritative: Option<T>) -> T {
        authoritative.unwrap_or(self.optimistic)
    }

    /// Settle by restoring the snapshot.
    pub fn rollback(self) -> T {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cart;
    use rust_decimal::Decimal;

    fn cart_with_ring() -> Cart {
        let mut cart = Cart::empty();
        cart.add("p1", "Ring", Decimal::from(500), "", 1);
        cart
    }

    #[test]
    fn apply_leaves_original_untouched() {
        let current = cart_with_ring();
        let tx = Optimistic::apply(&current, |cart| cart.clear());

        assert!(tx.optimistic().is_empty());
        assert_eq!(tx.snapshot(), &current);
        assert_eq!(current.items.len(), 1);
    }

    #[test]
    fn rollback_restores_snapshot() {
        let current = cart_with_ring();
        let tx = Optimistic::apply(&current, |cart| {
            cart.add("p2", "Chain", Decimal::from(200), "", 1);
        });

        assert_eq!(tx.optimistic().items.len(), 2);
        assert_eq!(tx.rollback(), current);
    }

    #[test]
    fn commit_prefers_authoritative_value() {
        let current = cart_with_ring();
        let tx = Optimistic::apply(&current, |cart| {
            cart.add("p1", "Ring", Decimal::from(500), "", 1);
        });

        let server = Cart::with_total(tx.optimistic().items.clone(), Decimal::from(900));
        let settled = tx.commit(Some(server.clone()));
        assert_eq!(settled, server);
    }

    #[test]
    fn commit_without_value_keeps_optimistic() {
        let current = cart_with_ring();
        let tx = Optimistic::apply(&current, |cart| cart.clear());
        assert!(tx.commit(None).is_empty());
    }
}
