//! Registration batches.
//!
//! A [`Bindings`] value collects builders for several keys; the container
//! applies a whole batch under one lifetime, atomically.

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, DiError, DiResult};
use crate::injectable::{autowire, Injectable};
use crate::key::{key_of_trait, key_of_type, Key};
use crate::provider::ResolverContext;
use crate::registration::{AnyArc, BuildFn};
use crate::traits::{AsyncDispose, Dispose, Resolver};

/// Ordered batch of key/builder pairs.
///
/// When a batch binds the same key twice, the later builder wins.
///
/// # Examples
///
/// ```
/// use scopewire::{Bindings, Container, Resolver};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English { name: Arc<String> }
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         format!("hello {}", self.name)
///     }
/// }
///
/// let container = Container::new();
/// container
///     .register_singletons(
///         Bindings::new()
///             .bind_value(String::from("world"))
///             .bind_trait::<dyn Greeter, _>(|ctx| {
///                 Ok(Arc::new(English { name: ctx.get::<String>()? }))
///             }),
///     )
///     .unwrap();
///
/// assert_eq!(container.get_trait::<dyn Greeter>().unwrap().greet(), "hello world");
/// ```
#[derive(Default, Clone)]
pub struct Bindings {
    entries: Vec<(Key, Arc<BuildFn>)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `T` to a builder.
    pub fn bind<T, F>(self, builder: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.push(
            key_of_type::<T>(),
            Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
                Ok(Arc::new(builder(ctx)?))
            }),
        )
    }

    /// Binds `T` to a builder that fails with its own error type.
    ///
    /// The error is reported as [`DiError::Unresolvable`] for `T` with the
    /// original error as its source; a [`DiError`] is passed through as-is.
    pub fn bind_fallible<T, E, F>(self, builder: F) -> Self
    where
        T: Send + Sync + 'static,
        E: Into<BoxError>,
        F: Fn(&ResolverContext<'_>) -> Result<T, E> + Send + Sync + 'static,
    {
        self.push(
            key_of_type::<T>(),
            Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
                let value = builder(ctx)
                    .map_err(|e| DiError::from_builder(std::any::type_name::<T>(), e.into()))?;
                Ok(Arc::new(value))
            }),
        )
    }

    /// Binds `T` to an existing value.
    ///
    /// Every resolution returns this same instance, whatever the lifetime of
    /// the batch.
    pub fn bind_value<T: Send + Sync + 'static>(self, value: T) -> Self {
        let value: AnyArc = Arc::new(value);
        self.push(
            key_of_type::<T>(),
            Arc::new(move |_: &ResolverContext<'_>| -> DiResult<AnyArc> { Ok(value.clone()) }),
        )
    }

    /// Binds a trait object such as `dyn Logger` to a builder.
    pub fn bind_trait<T, F>(self, builder: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ResolverContext<'_>) -> DiResult<Arc<T>> + Send + Sync + 'static,
    {
        self.push(
            key_of_trait::<T>(),
            Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
                // Trait objects are stored as Arc<Arc<dyn Trait>>
                Ok(Arc::new(builder(ctx)?))
            }),
        )
    }

    /// Binds a trait object to an existing implementation.
    pub fn bind_trait_value<T>(self, value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let stored: AnyArc = Arc::new(value);
        self.push(
            key_of_trait::<T>(),
            Arc::new(move |_: &ResolverContext<'_>| -> DiResult<AnyArc> { Ok(stored.clone()) }),
        )
    }

    /// Binds `T` to its auto-wiring constructor, so it can be given a
    /// cached lifetime.
    pub fn bind_injectable<T: Injectable>(self) -> Self {
        self.push(
            key_of_type::<T>(),
            Arc::new(|ctx: &ResolverContext<'_>| autowire::<T>(ctx)),
        )
    }

    /// Binds `T` to a builder and registers every built instance for
    /// disposal with the scope (or root) that owns it.
    pub fn bind_disposable<T, F>(self, builder: F) -> Self
    where
        T: Dispose,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.push(
            key_of_type::<T>(),
            Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
                let instance = Arc::new(builder(ctx)?);
                ctx.register_disposer(instance.clone());
                Ok(instance)
            }),
        )
    }

    /// Like [`bind_disposable`](Self::bind_disposable) for asynchronous
    /// teardown; the hook only runs on `close_async` or `dispose_all`.
    pub fn bind_async_disposable<T, F>(self, builder: F) -> Self
    where
        T: AsyncDispose,
        F: Fn(&ResolverContext<'_>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.push(
            key_of_type::<T>(),
            Arc::new(move |ctx: &ResolverContext<'_>| -> DiResult<AnyArc> {
                let instance = Arc::new(builder(ctx)?);
                ctx.register_async_disposer(instance.clone());
                Ok(instance)
            }),
        )
    }

    /// Keys bound by this batch, in binding order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<(Key, Arc<BuildFn>)> {
        self.entries
    }

    fn push(mut self, key: Key, builder: Arc<BuildFn>) -> Self {
        self.entries.push((key, builder));
        self
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.keys().map(Key::display_name))
            .finish()
    }
}
