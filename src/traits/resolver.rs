//! Resolver traits for dependency resolution.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::injectable::{autowire, Injectable};
use crate::internal::BoxFutureUnit;
use crate::key::{key_of_trait, key_of_type, Key};
use crate::registration::{AnyArc, AutowireFn};
use crate::traits::{AsyncDispose, Dispose};

/// Core resolver trait for object-safe, type-erased resolution.
///
/// Implemented by [`Container`](crate::Container), [`Scope`](crate::Scope),
/// the [`ResolverContext`](crate::ResolverContext) handed to builders and
/// [`ForkedResolver`](crate::ForkedResolver). Most callers use the generic
/// methods of [`Resolver`] instead.
pub trait ResolverCore {
    /// Resolves `key`, falling back to `autowire` when the key has no
    /// registration.
    ///
    /// Called on a container or scope this starts a new resolution call
    /// tree; called on a [`ResolverContext`](crate::ResolverContext) it
    /// extends the current one, so cycles are detected.
    fn resolve_any(&self, key: &Key, autowire: Option<AutowireFn>) -> DiResult<AnyArc>;

    /// Whether `key` has a registration.
    fn is_registered(&self, key: &Key) -> bool;

    /// Registers a synchronous disposal hook with the owning scope or root.
    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>);

    /// Registers an asynchronous disposal hook with the owning scope or root.
    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>);
}

/// High-level resolver interface with generic methods.
///
/// # Examples
///
/// ```
/// use scopewire::{Bindings, Container, Resolver};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, msg: &str) -> String;
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, msg: &str) -> String {
///         format!("LOG: {}", msg)
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register_singletons(
///         Bindings::new()
///             .bind_value(42usize)
///             .bind_trait_value(Arc::new(ConsoleLogger) as Arc<dyn Logger>),
///     )
///     .unwrap();
///
/// assert_eq!(*container.get::<usize>().unwrap(), 42);
/// let logger = container.get_trait::<dyn Logger>().unwrap();
/// assert_eq!(logger.log("ready"), "LOG: ready");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a registered concrete type.
    ///
    /// Fails with [`DiError::Unresolvable`] when `T` has no registration.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = key_of_type::<T>();
        let any = self.resolve_any(&key, None)?;
        downcast::<T>(&key, any)
    }

    /// Resolves a registered trait object such as `dyn Logger`.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        let key = key_of_trait::<T>();
        let any = self.resolve_any(&key, None)?;
        // Trait objects are stored as Arc<Arc<dyn Trait>>
        downcast::<Arc<T>>(&key, any).map(|boxed| (*boxed).clone())
    }

    /// Resolves `T`, auto-wiring it from its constructor parameters when it
    /// has no registration.
    ///
    /// Unregistered types are built fresh on every call (transient).
    fn autowire<T: Injectable>(&self) -> DiResult<Arc<T>> {
        let key = key_of_type::<T>();
        let any = self.resolve_any(&key, Some(autowire::<T>))?;
        downcast::<T>(&key, any)
    }

    /// Resolves `T` if registered, `Ok(None)` otherwise.
    fn try_get<T: Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
        if self.is_registered(&key_of_type::<T>()) {
            self.get::<T>().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Registers `service` to be disposed with the owning scope or root.
    fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.push_sync_disposer(Box::new(move || service.dispose()));
    }

    /// Registers `service` for asynchronous disposal with the owning scope or root.
    fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.push_async_disposer(Box::new(move || -> BoxFutureUnit {
            Box::pin(async move { service.dispose().await })
        }));
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

fn downcast<T: Send + Sync + 'static>(key: &Key, any: AnyArc) -> DiResult<Arc<T>> {
    any.downcast::<T>().map_err(|_| {
        DiError::unresolvable(
            key.display_name(),
            "registered builder produced an instance of a different type",
        )
    })
}
