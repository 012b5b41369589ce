//! Lifetime definitions.

use std::fmt;
use std::str::FromStr;

use crate::error::DiError;

/// Lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use scopewire::{Bindings, Container, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let container = Container::new();
/// container.register_singletons(Bindings::new().bind_value(Database {
///     url: "postgres://localhost".to_string(),
/// })).unwrap();
/// container.register_scoped(Bindings::new().bind(|r| {
///     let db = r.get::<Database>()?;
///     Ok(Repository { db_url: db.url.clone() })
/// })).unwrap();
/// container.register_transients(Bindings::new().bind(|_| {
///     Ok(RequestModel { id: 12345 })
/// })).unwrap();
///
/// let scope1 = container.create_scope();
/// let db1 = container.get::<Database>().unwrap();
/// let db2 = scope1.get::<Database>().unwrap();
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// let repo1a = scope1.get::<Repository>().unwrap();
/// let repo1b = scope1.get::<Repository>().unwrap();
/// assert!(Arc::ptr_eq(&repo1a, &repo1b));
///
/// let scope2 = container.create_scope();
/// let repo2 = scope2.get::<Repository>().unwrap();
/// assert!(!Arc::ptr_eq(&repo1a, &repo2));
///
/// let model1 = scope1.get::<RequestModel>().unwrap();
/// let model2 = scope1.get::<RequestModel>().unwrap();
/// assert!(!Arc::ptr_eq(&model1, &model2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Lifetime {
    /// Single instance per root container, cached until `clear()`
    ///
    /// Built on first request and shared across every scope and thread.
    Singleton,
    /// Single instance per scope, cached for the scope's lifetime
    ///
    /// Resolving a scoped key without an active scope is an error.
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }

    /// Whether instances of this lifetime are cached anywhere.
    pub fn is_cached(&self) -> bool {
        !matches!(self, Lifetime::Transient)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" => Ok(Lifetime::Scoped),
            "transient" => Ok(Lifetime::Transient),
            other => Err(DiError::Lifetime(format!(
                "unknown lifetime '{}', expected one of: singleton, scoped, transient",
                other
            ))),
        }
    }
}
