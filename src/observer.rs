//! Diagnostic observers for dependency resolution.
//!
//! Observers receive a callback when a resolution starts, when it completes
//! and when it fails. They are called synchronously on the resolving thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::DiError;
use crate::key::Key;

/// Observer trait for dependency resolution events.
///
/// Every callback has an empty default, so an observer implements only what
/// it needs. Nested resolutions produce nested callbacks: resolving `A` that
/// depends on `B` reports `resolving(A)`, `resolving(B)`, `resolved(B)`,
/// `resolved(A)`.
///
/// # Examples
///
/// ```
/// use scopewire::{Bindings, Container, DiObserver, Key, Resolver};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     resolved: Mutex<Vec<&'static str>>,
/// }
///
/// impl DiObserver for Recorder {
///     fn resolved(&self, key: &Key, _duration: Duration) {
///         self.resolved.lock().unwrap().push(key.short_name());
///     }
/// }
///
/// struct Config;
///
/// let recorder = Arc::new(Recorder::default());
/// let container = Container::new();
/// container.add_observer(recorder.clone());
/// container.register_singletons(Bindings::new().bind_value(Config)).unwrap();
/// container.get::<Config>().unwrap();
///
/// assert_eq!(*recorder.resolved.lock().unwrap(), vec!["Config"]);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a key is resolved.
    fn resolving(&self, _key: &Key) {}

    /// Called after a key was resolved, with the time taken (including
    /// nested resolutions and cache lookups).
    fn resolved(&self, _key: &Key, _duration: Duration) {}

    /// Called when resolving a key failed.
    fn resolution_failed(&self, _key: &Key, _error: &DiError) {}
}

/// Observers registered with one container.
///
/// Reads are lock-free when no observer is registered.
#[derive(Default)]
pub(crate) struct Observers {
    observers: RwLock<Vec<Arc<dyn DiObserver>>>,
    active: AtomicBool,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&self, observer: Arc<dyn DiObserver>) {
        self.observers.write().push(observer);
        self.active.store(true, Ordering::Release);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn resolving(&self, key: &Key) {
        for observer in self.snapshot() {
            observer.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in self.snapshot() {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn resolution_failed(&self, key: &Key, error: &DiError) {
        for observer in self.snapshot() {
            observer.resolution_failed(key, error);
        }
    }

    // Cloned out so an observer may resolve or add observers without deadlocking.
    fn snapshot(&self) -> Vec<Arc<dyn DiObserver>> {
        self.observers.read().clone()
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Starts and completions are emitted at `DEBUG`, failures at `WARN`, all
/// under the `scopewire::resolve` target.
///
/// # Examples
///
/// ```
/// use scopewire::{Container, LoggingObserver};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// container.add_observer(Arc::new(LoggingObserver::new()));
/// ```
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "scopewire".to_string(),
        }
    }

    /// Creates a logging observer whose events carry a custom `prefix` field.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::debug!(target: "scopewire::resolve", prefix = %self.prefix, key = %key, "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::debug!(
            target: "scopewire::resolve",
            prefix = %self.prefix,
            key = %key,
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(
            target: "scopewire::resolve",
            prefix = %self.prefix,
            key = %key,
            error = %error,
            "resolution failed"
        );
    }
}
