//! Resolver context for dependency injection.
//!
//! This module contains the ResolverContext type handed to every builder,
//! and the forked resolver used for concurrent fan-out inside a builder.

use std::cell::RefCell;

use crate::error::DiResult;
use crate::internal::{BoxFutureUnit, ResolutionStack};
use crate::key::Key;
use crate::registration::{AnyArc, AutowireFn};
use crate::traits::ResolverCore;

/// Resolution backend shared by the root container and its scopes.
pub(crate) trait Engine: Send + Sync {
    /// Resolves `key` as one step of the call tree tracked by `stack`.
    fn resolve_in(
        &self,
        key: &Key,
        autowire: Option<AutowireFn>,
        stack: &RefCell<ResolutionStack>,
    ) -> DiResult<AnyArc>;

    fn is_registered(&self, key: &Key) -> bool;

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>);
}

/// Context passed to builders for resolving their dependencies.
///
/// The context carries the resolution path of the current call tree, so
/// every nested `get` made through it is checked for cycles. It borrows the
/// path and cannot leave the builder call.
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
///         // ctx is the ResolverContext of this resolution
///         Ok(UserService { db: ctx.get::<Database>()? })
///     }))
///     .unwrap();
///
/// let service = container.get::<UserService>().unwrap();
/// assert_eq!(service.db.url, "postgres://localhost");
/// ```
pub struct ResolverContext<'a> {
    engine: &'a dyn Engine,
    stack: &'a RefCell<ResolutionStack>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(engine: &'a dyn Engine, stack: &'a RefCell<ResolutionStack>) -> Self {
        Self { engine, stack }
    }

    /// Keys currently being built, outermost first.
    pub fn path(&self) -> Vec<Key> {
        self.stack.borrow().keys().to_vec()
    }

    pub fn depth(&self) -> usize {
        self.stack.borrow().depth()
    }

    /// Creates an independent branch of this resolution for use on another
    /// thread.
    ///
    /// The branch starts from a copy of the current path: a dependency that
    /// leads back to a key being built here is still reported as a cycle,
    /// while sibling branches never see each other's entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use scopewire::{Bindings, Container, Resolver};
    /// use std::sync::Arc;
    ///
    /// struct Left(u8);
    /// struct Right(u8);
    /// struct Both(Arc<Left>, Arc<Right>);
    ///
    /// let container = Container::new();
    /// container
    ///     .register_transients(
    ///         Bindings::new()
    ///             .bind(|_| Ok(Left(1)))
    ///             .bind(|_| Ok(Right(2)))
    ///             .bind(|ctx| {
    ///                 let (left, right) = std::thread::scope(|s| {
    ///                     let branch = ctx.fork();
    ///                     let left = s.spawn(move || branch.get::<Left>());
    ///                     let right = ctx.get::<Right>();
    ///                     (left.join().expect("branch panicked"), right)
    ///                 });
    ///                 Ok(Both(left?, right?))
    ///             }),
    ///     )
    ///     .unwrap();
    ///
    /// let both = container.get::<Both>().unwrap();
    /// assert_eq!(both.0 .0 + both.1 .0, 3);
    /// ```
    pub fn fork(&self) -> ForkedResolver<'a> {
        ForkedResolver {
            engine: self.engine,
            stack: RefCell::new(self.stack.borrow().clone()),
        }
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, key: &Key, autowire: Option<AutowireFn>) -> DiResult<AnyArc> {
        self.engine.resolve_in(key, autowire, self.stack)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.engine.is_registered(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.engine.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.engine.push_async_disposer(f);
    }
}

/// Branch of a resolution call tree that can be moved to another thread.
///
/// Created by [`ResolverContext::fork`]. Each branch owns its copy of the
/// path it was forked from.
pub struct ForkedResolver<'a> {
    engine: &'a dyn Engine,
    stack: RefCell<ResolutionStack>,
}

impl ForkedResolver<'_> {
    /// Keys on this branch's path, outermost first.
    pub fn path(&self) -> Vec<Key> {
        self.stack.borrow().keys().to_vec()
    }
}

impl ResolverCore for ForkedResolver<'_> {
    fn resolve_any(&self, key: &Key, autowire: Option<AutowireFn>) -> DiResult<AnyArc> {
        self.engine.resolve_in(key, autowire, &self.stack)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.engine.is_registered(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        self.engine.push_sync_disposer(f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        self.engine.push_async_disposer(f);
    }
}
