//! Error types for the dependency injection container.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Boxed error accepted from builders.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Shared error cause, cloneable so one failure can be reported to several callers.
#[derive(Clone)]
pub struct ErrorCause(Arc<dyn StdError + Send + Sync + 'static>);

impl ErrorCause {
    pub(crate) fn new(error: BoxError) -> Self {
        ErrorCause(Arc::from(error))
    }

    /// Attempts to view the cause as a concrete error type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Debug for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for ErrorCause {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Dependency injection errors
///
/// Every failure raised by registration, resolution or scope handling is one
/// of these variants, so callers can match DI failures generically or by kind.
///
/// # Examples
///
/// ```rust
/// use scopewire::{Container, DiError, Resolver};
///
/// let container = Container::new();
/// match container.get::<String>() {
///     Err(DiError::Unresolvable { owner, .. }) => {
///         assert_eq!(owner, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use scopewire::DiError;
///
/// let circular = DiError::circular(vec!["ServiceA", "ServiceB", "ServiceA"]);
/// assert_eq!(
///     circular.to_string(),
///     "Circular dependency detected: ServiceA -> ServiceB -> ServiceA"
/// );
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// A key was re-entered while already on the active resolution path
    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CircularDependency {
        /// Ordered chain from the first occurrence of the key back to itself
        chain: Vec<&'static str>,
    },
    /// A key could not be built
    #[error("Cannot resolve dependency for type: {owner}{}. Reason: {reason}", parameter_suffix(.parameter))]
    Unresolvable {
        /// Type that could not be built
        owner: &'static str,
        /// Constructor parameter that failed, when the failure is parameter specific
        parameter: Option<&'static str>,
        /// Human readable reason
        reason: String,
        /// Originating error, when the failure came from a builder or a dependency
        #[source]
        source: Option<ErrorCause>,
    },
    /// Conflicting or invalid lifetime
    #[error("Lifetime error: {0}")]
    Lifetime(String),
    /// Scoped resolution without an active scope, or use of a closed scope
    #[error("Scope error: {0}")]
    Scope(String),
}

fn parameter_suffix(parameter: &Option<&'static str>) -> String {
    match parameter {
        Some(name) => format!(" (parameter '{}')", name),
        None => String::new(),
    }
}

impl DiError {
    /// Builds a circular dependency error from an ordered chain.
    pub fn circular(chain: Vec<&'static str>) -> Self {
        DiError::CircularDependency { chain }
    }

    /// Builds an unresolvable error without a parameter or cause.
    pub fn unresolvable(owner: &'static str, reason: impl Into<String>) -> Self {
        DiError::Unresolvable {
            owner,
            parameter: None,
            reason: reason.into(),
            source: None,
        }
    }

    /// Builds an unresolvable error for a specific constructor parameter.
    pub fn unresolvable_parameter(
        owner: &'static str,
        parameter: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        DiError::Unresolvable {
            owner,
            parameter: Some(parameter),
            reason: reason.into(),
            source: None,
        }
    }

    /// Wraps a builder failure for `owner`.
    ///
    /// Errors that already are [`DiError`]s pass through unchanged so the
    /// original kind (circular, scope, ...) reaches the caller.
    pub fn from_builder(owner: &'static str, error: BoxError) -> Self {
        match error.downcast::<DiError>() {
            Ok(di) => *di,
            Err(other) => DiError::Unresolvable {
                owner,
                parameter: None,
                reason: format!("Failed to create instance: {}", other),
                source: Some(ErrorCause::new(other)),
            },
        }
    }

    /// Attaches a cause to an unresolvable error. Other variants are returned unchanged.
    pub(crate) fn caused_by(self, cause: DiError) -> Self {
        match self {
            DiError::Unresolvable { owner, parameter, reason, .. } => DiError::Unresolvable {
                owner,
                parameter,
                reason,
                source: Some(ErrorCause::new(Box::new(cause))),
            },
            other => other,
        }
    }

    /// The reported chain for circular dependency errors.
    pub fn chain(&self) -> Option<&[&'static str]> {
        match self {
            DiError::CircularDependency { chain } => Some(chain),
            _ => None,
        }
    }

    pub fn is_circular(&self) -> bool {
        matches!(self, DiError::CircularDependency { .. })
    }

    pub fn is_unresolvable(&self) -> bool {
        matches!(self, DiError::Unresolvable { .. })
    }

    pub fn is_lifetime(&self) -> bool {
        matches!(self, DiError::Lifetime(_))
    }

    pub fn is_scope(&self) -> bool {
        matches!(self, DiError::Scope(_))
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
