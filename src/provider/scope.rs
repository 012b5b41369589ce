//! Scoped resolution and scope teardown.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use super::{Container, Engine, LifetimeManager};
use crate::error::{DiError, DiResult};
use crate::internal::{BoxFutureUnit, DisposeBag, InstanceCache, ResolutionStack};
use crate::key::Key;
use crate::registration::{AnyArc, AutowireFn};
use crate::traits::ResolverCore;

/// One unit of work with its own cache of scoped instances.
///
/// A scope resolves singletons from its root container, builds scoped keys
/// once per scope and transients on every call. Closing the scope runs the
/// disposal hooks registered by builds inside it and makes every further
/// resolution fail with [`DiError::Scope`].
///
/// # Examples
///
/// ```
/// use scopewire::{Bindings, Container, Resolver};
/// use std::sync::Arc;
///
/// struct DatabaseConnection(String);
/// struct UserService { db: Arc<DatabaseConnection> }
///
/// let container = Container::new();
/// container
///     .register_scoped(Bindings::new().bind(|_| {
///         Ok(DatabaseConnection("connection-123".to_string()))
///     }))
///     .unwrap();
/// container
///     .register_transients(Bindings::new().bind(|ctx| {
///         Ok(UserService { db: ctx.get::<DatabaseConnection>()? })
///     }))
///     .unwrap();
///
/// let scope = container.create_scope();
/// let user1 = scope.get::<UserService>().unwrap();
/// let user2 = scope.get::<UserService>().unwrap();
/// assert!(Arc::ptr_eq(&user1.db, &user2.db));
///
/// scope.close();
/// assert!(scope.get::<UserService>().err().unwrap().is_scope());
/// ```
pub struct Scope {
    root: Container,
    id: u64,
    cache: InstanceCache,
    disposers: Mutex<DisposeBag>,
    closed: AtomicBool,
    // Resolutions hold it shared; close takes it exclusively
    gate: RwLock<()>,
    // Root generation the cache belongs to
    generation: AtomicU64,
}

impl Scope {
    pub(crate) fn new(root: Container, id: u64, generation: u64) -> Self {
        Self {
            root,
            id,
            cache: InstanceCache::new(),
            disposers: Mutex::new(DisposeBag::default()),
            closed: AtomicBool::new(false),
            gate: RwLock::new(()),
            generation: AtomicU64::new(generation),
        }
    }

    /// Identifier of this scope, unique within its root container.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// The root container this scope belongs to.
    pub fn root(&self) -> &Container {
        &self.root
    }

    /// Creates a new scope of the same root container.
    ///
    /// The new scope does not share this scope's cache.
    pub fn create_scope(&self) -> Scope {
        self.root.create_scope()
    }

    /// Closes the scope: runs its synchronous disposal hooks in reverse
    /// registration order and drops its cached instances.
    ///
    /// Asynchronous hooks cannot run here; they are discarded with a
    /// warning. Use [`close_async`](Self::close_async) when builds inside
    /// the scope registered any. Closing twice is a no-op.
    ///
    /// Builds already running in this scope finish first, so their hooks
    /// are part of the teardown. A builder must not close its own scope.
    pub fn close(&self) {
        let Some(mut bag) = self.seal() else {
            return;
        };
        if bag.has_async() && self.root.options().warn_on_undisposed {
            tracing::warn!(
                scope = self.id,
                "scope closed synchronously with pending async disposers; use close_async()"
            );
        }
        bag.run_sync_lifo();
        self.cache.clear();
        tracing::debug!(scope = self.id, "scope closed");
    }

    /// Closes the scope, running asynchronous hooks first and then
    /// synchronous hooks, each in reverse registration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{AsyncDispose, Bindings, Container, Resolver};
    /// use async_trait::async_trait;
    ///
    /// struct Session;
    ///
    /// #[async_trait]
    /// impl AsyncDispose for Session {
    ///     async fn dispose(&self) {}
    /// }
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let container = Container::new();
    /// container
    ///     .register_scoped(Bindings::new().bind_async_disposable(|_| Ok(Session)))
    ///     .unwrap();
    ///
    /// let scope = container.create_scope();
    /// scope.get::<Session>().unwrap();
    /// scope.close_async().await;
    /// assert!(scope.is_closed());
    /// # }
    /// ```
    pub async fn close_async(&self) {
        let Some(mut bag) = self.seal() else {
            return;
        };
        bag.run_async_lifo().await;
        bag.run_sync_lifo();
        self.cache.clear();
        tracing::debug!(scope = self.id, "scope closed");
    }

    /// Marks the scope closed once in-flight builds are done and takes its
    /// hooks. `None` if it was already closed.
    fn seal(&self) -> Option<DisposeBag> {
        let _exclusive = self.gate.write();
        if self.closed.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(std::mem::take(&mut *self.disposers.lock()))
    }

    fn new_stack(&self) -> RefCell<ResolutionStack> {
        RefCell::new(ResolutionStack::with_max_depth(self.root.options().max_depth))
    }

    fn ensure_open(&self, key: &Key) -> DiResult<()> {
        if self.is_closed() {
            return Err(DiError::Scope(format!(
                "Cannot resolve {} from scope {} because it has been closed",
                key.display_name(),
                self.id
            )));
        }
        let current = self.root.generation();
        if self.generation.swap(current, Ordering::AcqRel) != current {
            // The root was cleared or restored since this cache was filled
            self.cache.clear();
        }
        Ok(())
    }
}

impl Engine for Scope {
    fn resolve_in(
        &self,
        key: &Key,
        autowire: Option<AutowireFn>,
        stack: &RefCell<ResolutionStack>,
    ) -> DiResult<AnyArc> {
        // Recursive: nested builds re-enter while a close may be waiting
        let _shared = self.gate.read_recursive();
        self.ensure_open(key)?;
        let lifetimes = LifetimeManager::scoped(&self.root.inner.singletons, &self.cache);
        self.root.resolve_with(self, lifetimes, key, autowire, stack)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.root.is_registered(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.disposers.lock().push_sync(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.disposers.lock().push_async(f);
    }
}

impl ResolverCore for Scope {
    fn resolve_any(&self, key: &Key, autowire: Option<AutowireFn>) -> DiResult<AnyArc> {
        let stack = self.new_stack();
        self.resolve_in(key, autowire, &stack)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.root.is_registered(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        Engine::push_sync_disposer(self, f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        Engine::push_async_disposer(self, f);
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .field("cached", &self.cache.len())
            .finish()
    }
}
