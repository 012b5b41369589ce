//! Teardown hooks for instances owned by a scope or the root container.

/// Synchronous teardown, run when the owning scope closes.
///
/// Hooks registered by builds inside a scope run newest first on
/// `Scope::close`, `Scope::close_async` or drop of the scope. Hooks of
/// singleton builds belong to the root and run on
/// `Container::dispose_all`.
///
/// # Examples
///
/// ```
/// use scopewire::{Bindings, Container, Dispose, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// struct Cache {
///     flushed: Arc<AtomicBool>,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         self.flushed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let flushed = Arc::new(AtomicBool::new(false));
/// let flag = flushed.clone();
///
/// let container = Container::new();
/// container
///     .register_scoped(Bindings::new().bind_disposable(move |_| Ok(Cache { flushed: flag.clone() })))
///     .unwrap();
///
/// let scope = container.create_scope();
/// scope.get::<Cache>().unwrap();
/// scope.close();
/// assert!(flushed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    fn dispose(&self);
}

/// Asynchronous teardown.
///
/// Only `Scope::close_async` and `Container::dispose_all` can await these
/// hooks; they run before the synchronous ones. A plain `close` or drop
/// discards them with a warning.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use scopewire::{AsyncDispose, Bindings, Container, Resolver};
///
/// struct Pool {
///     name: &'static str,
/// }
///
/// #[async_trait]
/// impl AsyncDispose for Pool {
///     async fn dispose(&self) {
///         tracing::info!(pool = self.name, "draining connections");
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let container = Container::new();
/// container
///     .register_singletons(Bindings::new().bind_async_disposable(|_| Ok(Pool { name: "primary" })))
///     .unwrap();
///
/// container.get::<Pool>().unwrap();
/// container.dispose_all().await;
/// # }
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    async fn dispose(&self);
}
