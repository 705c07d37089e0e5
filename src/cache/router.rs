//! Slot-to-node routing table.
//!
//! Holds an immutable snapshot of the cluster topology: slot → master
//! address. Hydration workers read concurrently; a refresh publishes a whole
//! replacement map under the write lock, so readers never observe a
//! half-updated table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::warn;

use super::client::SlotRange;

#[derive(Default)]
pub struct SlotRouter {
    map: RwLock<Arc<HashMap<u16, String>>>,
}

impl SlotRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the routing snapshot from a topology reply. Every slot in each
    /// range maps to the range's first node (the master); ranges without
    /// nodes are skipped.
    pub fn refresh(&self, ranges: &[SlotRange]) {
        let mut next = HashMap::new();
        for range in ranges {
            let Some(master) = range.nodes.first() else {
                continue;
            };
            for slot in range.start..=range.end {
                next.insert(slot, master.clone());
            }
        }
        *self.write_guard() = Arc::new(next);
    }

    /// Address of the master owning `slot`, if the router has been populated.
    pub fn node_for_slot(&self, slot: u16) -> Option<String> {
        self.snapshot().get(&slot).cloned()
    }

    /// Grab the current snapshot; the lock is held only for the Arc clone.
    pub fn snapshot(&self) -> Arc<HashMap<u16, String>> {
        match self.map.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => {
                warn!(lock = "slot_router", "recovered from poisoned read lock");
                Arc::clone(&poisoned.into_inner())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, Arc<HashMap<u16, String>>> {
        match self.map.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(lock = "slot_router", "recovered from poisoned write lock");
                poisoned.into_inner()
            }
        }
    }
}
