//! Per-key mutual exclusion.

use hashbrown::HashMap;
use parking_lot::{Mutex, RawMutex, lock_api::ArcMutexGuard};
use std::hash::Hash;
use std::sync::Arc;

/// Unused slots are swept once the table grows past this many keys.
const PRUNE_THRESHOLD: usize = 1024;

pub type KeyGuard = ArcMutexGuard<RawMutex, ()>;

/// A lazily grown table of mutexes, one per key.
///
/// Holders of different keys never block each other.
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `key` is free and return a guard holding it.
    pub fn lock(&self, key: &K) -> KeyGuard {
        let slot = {
            let mut slots = self.slots.lock();
            if slots.len() > PRUNE_THRESHOLD {
                slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            }
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        slot.lock_arc()
    }

    /// Number of keys with a live slot.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
