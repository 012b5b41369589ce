//! Lifetime policy: which cache, if any, holds an instance.

use crate::error::{DiError, DiResult};
use crate::internal::InstanceCache;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Registration};

/// View over the caches reachable from one resolver.
///
/// The root container sees only the singleton cache; a scope also sees its
/// own scoped cache.
pub(crate) struct LifetimeManager<'c> {
    singletons: &'c InstanceCache,
    scoped: Option<&'c InstanceCache>,
}

impl<'c> LifetimeManager<'c> {
    pub(crate) fn root(singletons: &'c InstanceCache) -> Self {
        Self { singletons, scoped: None }
    }

    pub(crate) fn scoped(singletons: &'c InstanceCache, scoped: &'c InstanceCache) -> Self {
        Self {
            singletons,
            scoped: Some(scoped),
        }
    }

    /// Returns the instance for `registration` according to its lifetime,
    /// running `build` on a cache miss.
    ///
    /// Cached lifetimes build at most once per cache even under concurrent
    /// callers; a failed build is not cached.
    pub(crate) fn get_or_create<F>(&self, registration: &Registration, build: F) -> DiResult<AnyArc>
    where
        F: FnOnce() -> DiResult<AnyArc>,
    {
        let key = registration.key();
        match registration.lifetime() {
            Lifetime::Transient => build(),
            Lifetime::Singleton => self.singletons.get_or_try_init(key, build),
            Lifetime::Scoped => match self.scoped {
                Some(cache) => cache.get_or_try_init(key, build),
                None => Err(DiError::Scope(format!(
                    "Cannot resolve scoped dependency {} without an active scope",
                    key.display_name()
                ))),
            },
        }
    }
}
