//! # scopewire
//!
//! Runtime dependency injection with singleton, scoped and transient
//! lifetimes, auto-wiring and cycle detection.
//!
//! ## Features
//!
//! - **Lifetimes**: one instance per container, per scope, or per resolution
//! - **Auto-wiring**: types implementing [`Injectable`] are built from their
//!   declared constructor parameters without registration
//! - **Cycle detection**: a revisited key fails with the full chain
//!   (`A -> B -> A`) instead of overflowing the stack
//! - **Thread-safe**: concurrent first resolutions of a singleton build it once
//! - **Scopes**: per-unit-of-work caches with LIFO disposal on close
//!
//! ## Quick Start
//!
//! ```rust
//! use scopewire::{Bindings, Container, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let container = Container::new();
//! container
//!     .register_singletons(Bindings::new().bind_value(Database {
//!         connection_string: "postgres://localhost".to_string(),
//!     }))
//!     .unwrap();
//! container
//!     .register_transients(Bindings::new().bind(|ctx| {
//!         Ok(UserService { db: ctx.get::<Database>()? })
//!     }))
//!     .unwrap();
//!
//! let user_service = container.get::<UserService>().unwrap();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Lifetimes
//!
//! - **Singleton**: created once and shared by the container and all its scopes
//! - **Scoped**: created once per [`Scope`]; resolving it without a scope fails
//! - **Transient**: created fresh on every resolution
//!
//! ## Cycles
//!
//! ```rust
//! use scopewire::{Arguments, BoxError, Container, Injectable, Parameter, Resolver};
//! use std::sync::Arc;
//!
//! struct A(Arc<B>);
//! struct B(Arc<A>);
//!
//! impl Injectable for A {
//!     fn parameters() -> Vec<Parameter> {
//!         vec![Parameter::injectable::<B>("b")]
//!     }
//!     fn construct(args: &mut Arguments) -> Result<Self, BoxError> {
//!         Ok(A(args.take("b")?))
//!     }
//! }
//!
//! impl Injectable for B {
//!     fn parameters() -> Vec<Parameter> {
//!         vec![Parameter::injectable::<A>("a")]
//!     }
//!     fn construct(args: &mut Arguments) -> Result<Self, BoxError> {
//!         Ok(B(args.take("a")?))
//!     }
//! }
//!
//! let err = Container::new().autowire::<A>().err().unwrap();
//! assert!(err.is_circular());
//! assert_eq!(err.chain().unwrap().len(), 3);
//! ```

// Module declarations
pub mod bindings;
pub mod config;
pub mod error;
pub mod injectable;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod testing;
pub mod traits;

#[cfg(feature = "axum-integration")]
pub mod axum_integration;

// Internal modules
mod internal;
mod registration;

// Re-exports
pub use bindings::Bindings;
pub use config::{ConfigError, ContainerOptions};
pub use error::{BoxError, DiError, DiResult, ErrorCause};
pub use injectable::{Arguments, Injectable, Parameter};
pub use internal::{BoxFutureUnit, ResolutionStack};
pub use key::{key_of_trait, key_of_type, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver};
pub use provider::{Container, ForkedResolver, ResolverContext, Scope};
pub use registration::{AnyArc, AutowireFn, Registration, RegistrySnapshot};
pub use traits::{AsyncDispose, Dispose, Resolver, ResolverCore};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_singleton_resolution() {
        let container = Container::new();
        container.register_singletons(Bindings::new().bind_value(42usize)).unwrap();

        let a = container.get::<usize>().unwrap();
        let b = container.get::<usize>().unwrap();
        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_transient_resolution() {
        let counter = Arc::new(AtomicUsize::new(0));
        let next = counter.clone();

        let container = Container::new();
        container
            .register_transients(Bindings::new().bind(move |_| {
                Ok(format!("instance-{}", next.fetch_add(1, Ordering::SeqCst) + 1))
            }))
            .unwrap();

        let a = container.get::<String>().unwrap();
        let b = container.get::<String>().unwrap();
        assert_eq!(a.as_str(), "instance-1");
        assert_eq!(b.as_str(), "instance-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_scoped_resolution() {
        let container = Container::new();
        container
            .register_scoped(Bindings::new().bind(|_| Ok(String::from("scoped"))))
            .unwrap();

        assert!(container.get::<String>().err().unwrap().is_scope());

        let scope1 = container.create_scope();
        let s1a = scope1.get::<String>().unwrap();
        let s1b = scope1.get::<String>().unwrap();
        assert!(Arc::ptr_eq(&s1a, &s1b));

        let scope2 = scope1.create_scope();
        let s2 = scope2.get::<String>().unwrap();
        assert!(!Arc::ptr_eq(&s1a, &s2));
    }

    #[test]
    fn test_trait_resolution() {
        trait TestTrait: Send + Sync {
            fn get_value(&self) -> i32;
        }

        struct TestImpl {
            value: i32,
        }

        impl TestTrait for TestImpl {
            fn get_value(&self) -> i32 {
                self.value
            }
        }

        let container = Container::new();
        container
            .register_singletons(
                Bindings::new().bind_trait_value(Arc::new(TestImpl { value: 42 }) as Arc<dyn TestTrait>),
            )
            .unwrap();

        let service = container.get_trait::<dyn TestTrait>().unwrap();
        assert_eq!(service.get_value(), 42);
    }

    #[test]
    fn test_singleton_cannot_capture_scoped() {
        struct Session;
        struct Cache(#[allow(dead_code)] Arc<Session>);

        let container = Container::new();
        container.register_scoped(Bindings::new().bind(|_| Ok(Session))).unwrap();
        container
            .register_singletons(Bindings::new().bind(|ctx| Ok(Cache(ctx.get::<Session>()?))))
            .unwrap();

        let scope = container.create_scope();
        assert!(scope.get::<Cache>().err().unwrap().is_scope());
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn test_debug_string_lists_registrations() {
        let container = Container::new();
        container.register_singletons(Bindings::new().bind_value(7u32)).unwrap();
        container.get::<u32>().unwrap();

        let dump = container.to_debug_string();
        assert!(dump.contains("u32: singleton (resolved 1 times)"));
        assert!(dump.contains("Cached singletons: 1"));
    }
}
