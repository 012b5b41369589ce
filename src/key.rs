//! Dependency key types for the dependency injection container.

use std::any::TypeId;
use std::fmt;

/// Key for registration storage and lookup.
///
/// Keys identify a registrable abstraction: either a concrete type or a
/// trait object. Lookups are exact; no subtype or supertrait matching is
/// ever attempted.
///
/// # Examples
///
/// ```rust
/// use scopewire::{Key, key_of_type, key_of_trait};
///
/// trait Logger: Send + Sync {}
///
/// let a = key_of_type::<u32>();
/// let b = key_of_type::<u32>();
/// assert_eq!(a, b);
/// assert_eq!(a.display_name(), "u32");
///
/// let t = key_of_trait::<dyn Logger>();
/// assert!(matches!(t, Key::Trait(_)));
/// assert_ne!(a, t);
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Key {
    /// Concrete type key with TypeId and name for diagnostics
    ///
    /// The TypeId drives equality and hashing; the name only feeds error
    /// messages and logs.
    Type(TypeId, &'static str),
    /// Trait object key (`dyn Trait`), identified by its type name
    Trait(&'static str),
}

impl Key {
    /// Get the type or trait name for display
    ///
    /// This is the `std::any::type_name` result used in error chains.
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Trait(name) => name,
        }
    }

    /// The last path segment of the display name, e.g. `Database` for
    /// `app::db::Database`. Generic arguments are kept intact.
    pub fn short_name(&self) -> &'static str {
        let name = self.display_name();
        let head = name.split('<').next().unwrap_or(name);
        match head.rfind("::") {
            Some(pos) => &name[pos + 2..],
            None => name,
        }
    }

    pub fn is_trait(&self) -> bool {
        matches!(self, Key::Trait(_))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // TypeId only; the name is diagnostic
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Trait(a), Key::Trait(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a.cmp(b),
            (Key::Trait(a), Key::Trait(b)) => a.cmp(b),
            (Key::Type(_, _), Key::Trait(_)) => Ordering::Less,
            (Key::Trait(_), Key::Type(_, _)) => Ordering::Greater,
        }
    }
}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Trait(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

/// Key for a concrete type.
#[inline(always)]
pub fn key_of_type<T: 'static>() -> Key {
    Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
}

/// Key for a trait object type such as `dyn Logger`.
#[inline(always)]
pub fn key_of_trait<T: ?Sized + 'static>() -> Key {
    Key::Trait(std::any::type_name::<T>())
}
