//! Root container and scopes.
//!
//! This module contains the [`Container`] façade, its [`Scope`]s and the
//! resolution algorithm they share.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::bindings::Bindings;
use crate::config::ContainerOptions;
use crate::error::{DiError, DiResult};
use crate::internal::{BoxFutureUnit, DisposeBag, InstanceCache, ResolutionStack, StackGuard};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::registration::{AnyArc, AutowireFn, BuildFn, Registration, Registry, RegistrySnapshot};
use crate::traits::ResolverCore;

pub mod context;
mod lifetime_manager;
pub mod scope;

pub use context::{ForkedResolver, ResolverContext};
pub(crate) use context::Engine;
use lifetime_manager::LifetimeManager;
pub use scope::Scope;

/// Dependency injection container.
///
/// The container owns the registry and the singleton cache. It resolves
/// singletons and transients directly; scoped keys need a [`Scope`] created
/// with [`create_scope`](Container::create_scope).
///
/// `Container` is a cheap handle: clones share the same registry and caches,
/// and it can be used from many threads at once.
///
/// # Examples
///
/// ```
/// use scopewire::{Bindings, Container, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let container = Container::new();
/// container
///     .register_singletons(Bindings::new().bind_value(Database {
///         url: "postgres://localhost".to_string(),
///     }))
///     .unwrap();
/// container
///     .register_transients(Bindings::new().bind(|ctx| {
///         Ok(UserService { db: ctx.get::<Database>()? })
///     }))
///     .unwrap();
///
/// let service = container.get::<UserService>().unwrap();
/// assert_eq!(service.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    registry: RwLock<Registry>,
    singletons: InstanceCache,
    disposers: Mutex<DisposeBag>,
    observers: Observers,
    options: ContainerOptions,
    // Bumped by clear/restore; live scopes drop their cache when it moves.
    generation: AtomicU64,
    next_scope_id: AtomicU64,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(mut options: ContainerOptions) -> Self {
        if options.max_depth == 0 {
            tracing::warn!("max_depth 0 would reject every resolution; using 1");
            options.max_depth = 1;
        }
        Self {
            inner: Arc::new(ContainerInner {
                registry: RwLock::new(Registry::new()),
                singletons: InstanceCache::new(),
                disposers: Mutex::new(DisposeBag::default()),
                observers: Observers::new(),
                options,
                generation: AtomicU64::new(0),
                next_scope_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// Registers a batch of singletons.
    pub fn register_singletons(&self, bindings: Bindings) -> DiResult<()> {
        self.register(Lifetime::Singleton, bindings)
    }

    /// Registers a batch of transients.
    pub fn register_transients(&self, bindings: Bindings) -> DiResult<()> {
        self.register(Lifetime::Transient, bindings)
    }

    /// Registers a batch of scoped keys.
    pub fn register_scoped(&self, bindings: Bindings) -> DiResult<()> {
        self.register(Lifetime::Scoped, bindings)
    }

    /// Registers every binding of the batch under `lifetime`.
    ///
    /// The batch is applied atomically: if any key is already registered
    /// with a different lifetime the call fails with [`DiError::Lifetime`]
    /// and nothing is registered. A key re-registered with the same
    /// lifetime gets the new builder; a cached singleton built by the old
    /// one is dropped, and live scopes drop their caches on next use.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{Bindings, Container, Resolver};
    ///
    /// struct Clock;
    /// struct Mailer;
    ///
    /// let container = Container::new();
    /// container.register_singletons(Bindings::new().bind_value(Clock)).unwrap();
    ///
    /// let err = container
    ///     .register_transients(Bindings::new().bind_value(Mailer).bind_value(Clock))
    ///     .unwrap_err();
    /// assert!(err.is_lifetime());
    /// assert!(container.get::<Mailer>().is_err());
    /// ```
    pub fn register(&self, lifetime: Lifetime, bindings: Bindings) -> DiResult<()> {
        let entries = bindings.into_entries();
        let count = entries.len();

        let mut registry = self.inner.registry.write();
        registry.validate_batch(lifetime, entries.iter().map(|(key, _)| key))?;
        self.apply(&mut registry, lifetime, entries);
        drop(registry);

        tracing::debug!(%lifetime, count, "registered batch");
        Ok(())
    }

    /// Replaces registrations without the lifetime check.
    pub(crate) fn override_registrations(&self, lifetime: Lifetime, bindings: Bindings) {
        let entries = bindings.into_entries();
        let mut registry = self.inner.registry.write();
        self.apply(&mut registry, lifetime, entries);
    }

    fn apply(
        &self,
        registry: &mut Registry,
        lifetime: Lifetime,
        entries: Vec<(Key, Arc<BuildFn>)>,
    ) {
        let mut replaced = false;
        for (key, builder) in entries {
            if registry.remove(&key).is_some() {
                self.inner.singletons.remove(&key);
                replaced = true;
            }
            registry.insert(Registration::new(key, lifetime, builder));
        }
        if replaced {
            // Live scopes may still cache instances of the replaced builders
            self.inner.generation.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Creates a new scope of this container.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{Bindings, Container, Resolver};
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::sync::Arc;
    ///
    /// struct RequestId(u32);
    ///
    /// let counter = Arc::new(AtomicU32::new(0));
    /// let next = counter.clone();
    ///
    /// let container = Container::new();
    /// container
    ///     .register_scoped(Bindings::new().bind(move |_| {
    ///         Ok(RequestId(next.fetch_add(1, Ordering::SeqCst)))
    ///     }))
    ///     .unwrap();
    ///
    /// let scope1 = container.create_scope();
    /// let scope2 = container.create_scope();
    ///
    /// let req1a = scope1.get::<RequestId>().unwrap();
    /// let req1b = scope1.get::<RequestId>().unwrap();
    /// let req2 = scope2.get::<RequestId>().unwrap();
    ///
    /// assert!(Arc::ptr_eq(&req1a, &req1b));
    /// assert!(!Arc::ptr_eq(&req1a, &req2));
    /// ```
    pub fn create_scope(&self) -> Scope {
        let id = self.inner.next_scope_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(scope = id, "scope created");
        Scope::new(self.clone(), id, self.generation())
    }

    /// Runs `f` inside a new scope and closes the scope afterwards.
    ///
    /// The scope is closed even if `f` panics.
    pub fn with_scope<R>(&self, f: impl FnOnce(&Scope) -> R) -> R {
        let scope = self.create_scope();
        let result = f(&scope);
        scope.close();
        result
    }

    /// Removes every registration and forgets every cached instance.
    ///
    /// Live scopes drop their cached instances on their next resolution.
    /// Instances already handed out stay valid.
    pub fn clear(&self) {
        let mut registry = self.inner.registry.write();
        registry.clear();
        self.invalidate();
        drop(registry);
        tracing::debug!("container cleared");
    }

    /// Copies the current registrations.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.inner.registry.read().snapshot()
    }

    /// Replaces every registration with the snapshot's and forgets cached
    /// instances.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{Bindings, Container};
    ///
    /// let original = Container::new();
    /// original.register_singletons(Bindings::new().bind_value(7u32)).unwrap();
    ///
    /// let derived = Container::new();
    /// derived.restore(&original.snapshot());
    /// assert_eq!(derived.snapshot(), original.snapshot());
    /// ```
    pub fn restore(&self, snapshot: &RegistrySnapshot) {
        let mut registry = self.inner.registry.write();
        registry.restore(snapshot);
        self.invalidate();
        drop(registry);
        tracing::debug!(count = snapshot.len(), "registrations restored");
    }

    pub fn is_registered(&self, key: &Key) -> bool {
        self.inner.registry.read().contains_key(key)
    }

    pub fn lifetime_of(&self, key: &Key) -> Option<Lifetime> {
        self.inner.registry.read().get(key).map(Registration::lifetime)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.inner.registry.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How many times `key` was successfully resolved through its current
    /// registration (cache hits included). Zero for unregistered keys.
    pub fn resolution_count(&self, key: &Key) -> u64 {
        self.inner
            .registry
            .read()
            .get(key)
            .map_or(0, Registration::resolution_count)
    }

    /// Adds an observer notified of every resolution through this container
    /// and its scopes.
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) {
        self.inner.observers.add(observer);
    }

    /// Runs the disposal hooks registered with the root (singleton builds
    /// and root-level transients): async hooks first, then sync hooks, each
    /// in reverse registration order.
    pub async fn dispose_all(&self) {
        let mut bag = std::mem::take(&mut *self.inner.disposers.lock());
        bag.run_async_lifo().await;
        bag.run_sync_lifo();
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container ===\n");
        for registration in self.snapshot().iter() {
            s.push_str(&format!(
                "  {}: {} (resolved {} times)\n",
                registration.key(),
                registration.lifetime(),
                registration.resolution_count()
            ));
        }
        s.push_str(&format!("Cached singletons: {}\n", self.inner.singletons.len()));
        s
    }

    pub(crate) fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::Acquire)
    }

    fn invalidate(&self) {
        self.inner.singletons.clear();
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn new_stack(&self) -> RefCell<ResolutionStack> {
        RefCell::new(ResolutionStack::with_max_depth(self.inner.options.max_depth))
    }

    /// One resolution step shared by the root and its scopes.
    ///
    /// `current` is the resolver that transient and scoped builders see;
    /// singleton builders always see the root.
    fn resolve_with(
        &self,
        current: &dyn Engine,
        lifetimes: LifetimeManager<'_>,
        key: &Key,
        autowire: Option<AutowireFn>,
        stack: &RefCell<ResolutionStack>,
    ) -> DiResult<AnyArc> {
        let observers = &self.inner.observers;
        let started = observers.has_observers().then(|| {
            observers.resolving(key);
            Instant::now()
        });

        let result = self.build(current, lifetimes, key, autowire, stack);

        if let Some(started) = started {
            match &result {
                Ok(_) => observers.resolved(key, started.elapsed()),
                Err(err) => observers.resolution_failed(key, err),
            }
        }
        result
    }

    fn build(
        &self,
        current: &dyn Engine,
        lifetimes: LifetimeManager<'_>,
        key: &Key,
        autowire: Option<AutowireFn>,
        stack: &RefCell<ResolutionStack>,
    ) -> DiResult<AnyArc> {
        let _guard = StackGuard::enter(stack, key)?;
        tracing::trace!(key = %key, depth = stack.borrow().depth(), "resolving");

        // Cloned out so no registry lock is held while builders run
        let registration = self.inner.registry.read().get(key).cloned();

        match registration {
            Some(registration) => {
                let instance = lifetimes.get_or_create(&registration, || {
                    let engine: &dyn Engine = match registration.lifetime() {
                        Lifetime::Singleton => self,
                        Lifetime::Scoped | Lifetime::Transient => current,
                    };
                    (registration.builder)(&ResolverContext::new(engine, stack))
                })?;
                registration.record_resolution();
                Ok(instance)
            }
            None => match autowire {
                Some(autowire) => autowire(&ResolverContext::new(current, stack)),
                None => Err(DiError::unresolvable(
                    key.display_name(),
                    "no registration found and the type cannot be auto-wired",
                )),
            },
        }
    }
}

impl Engine for Container {
    fn resolve_in(
        &self,
        key: &Key,
        autowire: Option<AutowireFn>,
        stack: &RefCell<ResolutionStack>,
    ) -> DiResult<AnyArc> {
        self.resolve_with(self, LifetimeManager::root(&self.inner.singletons), key, autowire, stack)
    }

    fn is_registered(&self, key: &Key) -> bool {
        Container::is_registered(self, key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.inner.disposers.lock().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.inner.disposers.lock().push_async(f);
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, key: &Key, autowire: Option<AutowireFn>) -> DiResult<AnyArc> {
        let stack = self.new_stack();
        self.resolve_in(key, autowire, &stack)
    }

    fn is_registered(&self, key: &Key) -> bool {
        Container::is_registered(self, key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        Engine::push_sync_disposer(self, f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        Engine::push_async_disposer(self, f);
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if self.options.warn_on_undisposed && !self.disposers.get_mut().is_empty() {
            tracing::warn!(
                "container dropped with undisposed resources; call dispose_all().await before dropping"
            );
        }
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.len())
            .field("options", &self.inner.options)
            .finish()
    }
}
