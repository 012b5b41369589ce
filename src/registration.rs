//! Registration records and the registry that stores them.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;

/// Type-erased shared instance as stored in the caches.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Builds an unregistered type from its constructor parameters.
pub type AutowireFn = for<'a, 'b> fn(&'a ResolverContext<'b>) -> DiResult<AnyArc>;

/// Type-erased builder stored in a registration.
pub(crate) type BuildFn = dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync;

/// Registration record: key, lifetime and builder.
///
/// Records are cheap to clone; clones share the builder, so builder
/// identity survives snapshots. Snapshots and restores give each record
/// its own resolution counter.
#[derive(Clone)]
pub struct Registration {
    key: Key,
    lifetime: Lifetime,
    pub(crate) builder: Arc<BuildFn>,
    resolutions: Arc<AtomicU64>,
}

impl Registration {
    pub(crate) fn new(key: Key, lifetime: Lifetime, builder: Arc<BuildFn>) -> Self {
        Self {
            key,
            lifetime,
            builder,
            resolutions: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Whether both records share the same builder instance.
    pub fn same_builder(&self, other: &Registration) -> bool {
        // Compare data pointers only; vtable pointers may differ across codegen units.
        std::ptr::eq(
            Arc::as_ptr(&self.builder) as *const (),
            Arc::as_ptr(&other.builder) as *const (),
        )
    }

    /// Number of successful resolutions through this record.
    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub(crate) fn record_resolution(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy with its own resolution counter, starting from the current count.
    fn detached(&self) -> Self {
        Self {
            resolutions: Arc::new(AtomicU64::new(self.resolution_count())),
            ..self.clone()
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("key", &self.key.display_name())
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Registry holding at most one record per key.
#[derive(Default, Clone)]
pub(crate) struct Registry {
    entries: HashMap<Key, Registration>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for its key.
    pub(crate) fn insert(&mut self, registration: Registration) {
        self.entries.insert(*registration.key(), registration);
    }

    #[inline(always)]
    pub(crate) fn get(&self, key: &Key) -> Option<&Registration> {
        self.entries.get(key)
    }

    pub(crate) fn contains_key(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn remove(&mut self, key: &Key) -> Option<Registration> {
        self.entries.remove(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    /// Checks a batch against the current records without mutating anything.
    ///
    /// A key already registered under a different lifetime rejects the whole
    /// batch.
    pub(crate) fn validate_batch<'r>(
        &self,
        lifetime: Lifetime,
        batch: impl IntoIterator<Item = &'r Key>,
    ) -> DiResult<()> {
        for key in batch {
            if let Some(existing) = self.get(key) {
                if existing.lifetime() != lifetime {
                    return Err(DiError::Lifetime(format!(
                        "Dependency {} is already registered with lifetime {}, cannot re-register with {}",
                        key.display_name(),
                        existing.lifetime(),
                        lifetime
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> RegistrySnapshot {
        let mut entries: Vec<Registration> =
            self.entries.values().map(Registration::detached).collect();
        entries.sort_by(|a, b| a.key().cmp(b.key()));
        RegistrySnapshot { entries }
    }

    /// Replaces every record with the snapshot's contents.
    pub(crate) fn restore(&mut self, snapshot: &RegistrySnapshot) {
        self.entries = snapshot
            .entries
            .iter()
            .map(|reg| (*reg.key(), reg.detached()))
            .collect();
    }
}

/// Point-in-time copy of a container's registrations.
///
/// Two snapshots are equal when they hold the same keys with the same
/// lifetimes and the same builder instances.
#[derive(Clone, Default)]
pub struct RegistrySnapshot {
    entries: Vec<Registration>,
}

impl RegistrySnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.iter()
    }

    pub fn get(&self, key: &Key) -> Option<&Registration> {
        self.entries.iter().find(|reg| reg.key() == key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }
}

impl PartialEq for RegistrySnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().zip(other.entries.iter()).all(|(a, b)| {
                a.key() == b.key() && a.lifetime() == b.lifetime() && a.same_builder(b)
            })
    }
}

impl fmt::Debug for RegistrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of_type;

    fn record<T: 'static>(lifetime: Lifetime) -> Registration {
        Registration::new(
            key_of_type::<T>(),
            lifetime,
            Arc::new(|_: &ResolverContext<'_>| Ok(Arc::new(()) as AnyArc)),
        )
    }

    #[test]
    fn insert_replaces_existing_record() {
        let mut registry = Registry::new();
        let first = record::<u8>(Lifetime::Singleton);
        let second = record::<u8>(Lifetime::Singleton);
        registry.insert(first.clone());
        registry.insert(second.clone());

        assert_eq!(registry.len(), 1);
        let stored = registry.get(&key_of_type::<u8>()).unwrap();
        assert!(stored.same_builder(&second));
        assert!(!stored.same_builder(&first));
    }

    #[test]
    fn validate_rejects_conflicting_lifetime() {
        let mut registry = Registry::new();
        registry.insert(record::<u8>(Lifetime::Singleton));

        let keys = [key_of_type::<u16>(), key_of_type::<u8>()];
        let err = registry.validate_batch(Lifetime::Transient, keys.iter()).unwrap_err();
        assert!(err.is_lifetime());
        assert!(registry.validate_batch(Lifetime::Singleton, keys.iter()).is_ok());
    }

    #[test]
    fn snapshot_restore_preserves_identity() {
        let mut registry = Registry::new();
        registry.insert(record::<u8>(Lifetime::Singleton));
        registry.insert(record::<u16>(Lifetime::Scoped));
        let snapshot = registry.snapshot();

        let mut fresh = Registry::new();
        fresh.restore(&snapshot);
        assert_eq!(fresh.snapshot(), snapshot);
    }
}
