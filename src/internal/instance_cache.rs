//! Sharded per-key instance cache backing singleton and scoped lifetimes.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::error::DiResult;
use crate::key::Key;
use crate::registration::AnyArc;

/// Number of shards. Powers of 2 work best for hash distribution.
const SHARD_COUNT: usize = 16;

type Slot = Arc<OnceCell<AnyArc>>;

/// Instance cache with one initialization slot per key.
///
/// - **Hit**: one shard read lock plus an atomic load.
/// - **Miss**: the slot is created under the shard write lock, which is
///   released before the builder runs. The slot itself serializes
///   concurrent builds of the same key; other keys are never blocked.
/// - **Failed build**: the slot stays empty and the next caller retries.
pub(crate) struct InstanceCache {
    shards: [RwLock<HashMap<Key, Slot>>; SHARD_COUNT],
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self {
            shards: std::array::from_fn(|_| RwLock::new(HashMap::new())),
        }
    }

    /// Returns the cached instance for `key`, or runs `build` exactly once
    /// across all concurrent callers and caches its result.
    pub(crate) fn get_or_try_init<F>(&self, key: &Key, build: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        let slot = self.slot(key);
        slot.get_or_try_init(build).cloned()
    }

    /// Gets an existing instance without building.
    #[cfg(test)]
    pub(crate) fn get(&self, key: &Key) -> Option<AnyArc> {
        let shard = self.shards[shard_index(key)].read();
        shard.get(key)?.get().cloned()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Forgets every cached instance. Holders of previously returned
    /// instances keep them.
    pub(crate) fn clear(&self) {
        for shard in &self.shards {
            shard.write().clear();
        }
    }

    pub(crate) fn remove(&self, key: &Key) {
        self.shards[shard_index(key)].write().remove(key);
    }

    /// Number of initialized entries.
    pub(crate) fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.read().values().filter(|slot| slot.get().is_some()).count())
            .sum()
    }

    fn slot(&self, key: &Key) -> Slot {
        let shard = &self.shards[shard_index(key)];

        // Fast path: slot already exists
        if let Some(slot) = shard.read().get(key) {
            return slot.clone();
        }

        // Slow path: insert the slot (once per key)
        shard.write().entry(*key).or_default().clone()
    }
}

impl Default for InstanceCache {
    fn default() -> Self {
        Self::new()
    }
}

fn shard_index(key: &Key) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % SHARD_COUNT
}
