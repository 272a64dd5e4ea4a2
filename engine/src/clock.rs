//! Logical clock and sequence gate for ordering responses.
//!
//! Remote calls for the same resource can resolve out of order. Every
//! mutation is stamped with a tick of the device's logical clock, and the
//! gate only admits a response whose stamp is newer than the last one
//! applied to that resource.

use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A logical clock that provides causal ordering.
///
/// Ordering rules:
/// 1. Higher counter wins
/// 2. If counters equal, lexicographically higher node_id wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalClock {
    /// Identifier of the device issuing stamps
    pub node_id: NodeId,
    /// Monotonically increasing counter
    pub counter: u64,
}

impl LogicalClock {
    /// Create a new clock for a node, starting at counter 0.
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            node_id: node_id.into(),
            counter: 0,
        }
    }

    /// Create a clock with a specific counter value.
    pub fn with_counter(node_id: impl Into<NodeId>, counter: u64) -> Self {
        Self {
            node_id: node_id.into(),
            counter,
        }
    }

    /// Increment the clock and return the new value.
    pub fn tick(&mut self) -> &Self {
        self.counter += 1;
        self
    }

    /// Returns true only if this clock is strictly less than other.
    pub fn happened_before(&self, other: &LogicalClock) -> bool {
        self.counter < other.counter
    }
}

impl Ord for LogicalClock {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.counter.cmp(&other.counter) {
            Ordering::Equal => self.node_id.cmp(&other.node_id),
            other => other,
        }
    }
}

impl PartialOrd for LogicalClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Issues stamps and discards responses older than the last applied one.
///
/// Resources are keyed by name (`"cart"`, `"wishlist"`), so a slow cart
/// response never blocks a wishlist update.
#[derive(Debug, Clone)]
pub struct SequenceGate {
    clock: LogicalClock,
    applied: HashMap<String, LogicalClock>,
}

impl SequenceGate {
    /// Create a gate for a device.
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        Self {
            clock: LogicalClock::new(node_id),
            applied: HashMap::new(),
        }
    }

    /// Tick the clock and return the stamp for a new mutation.
    pub fn issue(&mut self) -> LogicalClock {
        self.clock.tick();
        self.clock.clone()
    }

    /// Record `stamp` as applied to `resource` if nothing newer was applied.
    ///
    /// Returns false when the stamp is stale and its result must be dropped.
    pub fn admit(&mut self, resource: &str, stamp: &LogicalClock) -> bool {
        match self.applied.get_mut(resource) {
            Some(last) if !last.happened_before(stamp) => false,
            Some(last) => {
                *last = stamp.clone();
                true
            }
            None => {
                self.applied.insert(resource.to_string(), stamp.clone());
                true
            }
        }
    }

    /// The last stamp applied to `resource`, if any.
    pub fn last_applied(&self, resource: &str) -> Option<&LogicalClock> {
        self.applied.get(resource)
    }

    /// Current clock value.
    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }
}
