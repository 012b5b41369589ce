//! Test doubles: a container that shadows another container's registrations.
//!
//! ```
//! use scopewire::testing::TestContainer;
//! use scopewire::{Bindings, Container, Resolver};
//! use std::sync::Arc;
//!
//! trait Mailer: Send + Sync {
//!     fn send(&self) -> &'static str;
//! }
//! struct Smtp;
//! impl Mailer for Smtp {
//!     fn send(&self) -> &'static str { "smtp" }
//! }
//! struct Fake;
//! impl Mailer for Fake {
//!     fn send(&self) -> &'static str { "fake" }
//! }
//!
//! let production = Container::new();
//! production
//!     .register_singletons(Bindings::new().bind_trait_value(Arc::new(Smtp) as Arc<dyn Mailer>))
//!     .unwrap();
//!
//! let test = TestContainer::new(&production);
//! test.mock_trait::<dyn Mailer>(Arc::new(Fake));
//!
//! assert_eq!(test.get_trait::<dyn Mailer>().unwrap().send(), "fake");
//! assert_eq!(production.get_trait::<dyn Mailer>().unwrap().send(), "smtp");
//! ```

use std::ops::Deref;
use std::sync::Arc;

use crate::bindings::Bindings;
use crate::error::DiResult;
use crate::internal::BoxFutureUnit;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::provider::Container;
use crate::registration::{AnyArc, AutowireFn, RegistrySnapshot};
use crate::traits::ResolverCore;

/// Container for tests, seeded with a parent's registrations.
///
/// The test container has its own registry and singleton cache: overrides
/// and mocks never reach the parent, and singletons already built by the
/// parent are not shared.
pub struct TestContainer {
    container: Container,
    baseline: RegistrySnapshot,
}

impl TestContainer {
    /// Creates a test container holding a copy of `parent`'s registrations.
    pub fn new(parent: &Container) -> Self {
        Self::from_snapshot(parent.snapshot())
    }

    fn from_snapshot(baseline: RegistrySnapshot) -> Self {
        let container = Container::new();
        container.restore(&baseline);
        Self { container, baseline }
    }

    /// Replaces `T` with a fixed instance.
    pub fn mock_singleton<T: Send + Sync + 'static>(&self, instance: T) {
        self.container
            .override_registrations(Lifetime::Singleton, Bindings::new().bind_value(instance));
    }

    /// Replaces a trait object binding with a fixed implementation.
    pub fn mock_trait<T: ?Sized + Send + Sync + 'static>(&self, instance: Arc<T>) {
        self.container
            .override_registrations(Lifetime::Singleton, Bindings::new().bind_trait_value(instance));
    }

    /// Replaces `T` with a factory called on every resolution.
    pub fn mock_transient<T, F>(&self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.container.override_registrations(
            Lifetime::Transient,
            Bindings::new().bind(move |_| Ok(factory())),
        );
    }

    /// Replaces every binding of `bindings` under `lifetime`, regardless of
    /// the lifetime the keys had before.
    pub fn override_registration(&self, lifetime: Lifetime, bindings: Bindings) {
        self.container.override_registrations(lifetime, bindings);
    }

    /// Drops every override and cached instance, going back to the parent's
    /// registrations as they were when this container was created.
    pub fn reset_overrides(&self) {
        self.container.restore(&self.baseline);
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}

impl Deref for TestContainer {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl ResolverCore for TestContainer {
    fn resolve_any(&self, key: &Key, autowire: Option<AutowireFn>) -> DiResult<AnyArc> {
        self.container.resolve_any(key, autowire)
    }

    fn is_registered(&self, key: &Key) -> bool {
        self.container.is_registered(key)
    }

    fn push_sync_disposer(&self, f: Box<dyn FnOnce() + Send>) {
        ResolverCore::push_sync_disposer(&self.container, f);
    }

    fn push_async_disposer(&self, f: Box<dyn FnOnce() -> BoxFutureUnit + Send>) {
        ResolverCore::push_async_disposer(&self.container, f);
    }
}

/// Creates a test container with no parent, seeded with `singletons`.
///
/// The seeded mocks are the container's baseline: `reset_overrides` keeps
/// them.
pub fn create_mock_container(singletons: Bindings) -> TestContainer {
    let seed = Container::new();
    seed.override_registrations(Lifetime::Singleton, singletons);
    TestContainer::from_snapshot(seed.snapshot())
}
