//! Auto-wiring: constructor parameter descriptions and the resolver that
//! builds unregistered types from them.
//!
//! Rust has no runtime reflection over constructors, so a type opts into
//! auto-wiring by implementing [`Injectable`]: it lists its constructor
//! parameters in declaration order and builds itself from the resolved
//! [`Arguments`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, DiError, DiResult};
use crate::key::{key_of_trait, key_of_type, Key};
use crate::provider::ResolverContext;
use crate::registration::{AnyArc, AutowireFn};
use crate::traits::ResolverCore;

type DefaultFn = Arc<dyn Fn() -> AnyArc + Send + Sync>;

/// A type whose instances can be built from its declared constructor
/// parameters.
///
/// # Examples
///
/// ```
/// use scopewire::{Arguments, BoxError, Container, Injectable, Parameter, Resolver};
/// use std::sync::Arc;
///
/// struct Config { url: String }
///
/// impl Injectable for Config {
///     fn parameters() -> Vec<Parameter> {
///         Vec::new()
///     }
///     fn construct(_: &mut Arguments) -> Result<Self, BoxError> {
///         Ok(Config { url: "postgres://localhost".into() })
///     }
/// }
///
/// struct Repository { config: Arc<Config> }
///
/// impl Injectable for Repository {
///     fn parameters() -> Vec<Parameter> {
///         vec![Parameter::injectable::<Config>("config")]
///     }
///     fn construct(args: &mut Arguments) -> Result<Self, BoxError> {
///         Ok(Repository { config: args.take("config")? })
///     }
/// }
///
/// let container = Container::new();
/// let repo = container.autowire::<Repository>().unwrap();
/// assert_eq!(repo.config.url, "postgres://localhost");
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Constructor parameters in declaration order.
    fn parameters() -> Vec<Parameter>;

    /// Builds the instance from resolved arguments.
    fn construct(args: &mut Arguments) -> Result<Self, BoxError>;
}

/// One constructor parameter: its name, the dependency key it declares
/// (if any), and an optional default value.
#[derive(Clone)]
pub struct Parameter {
    name: &'static str,
    key: Option<Key>,
    autowire: Option<AutowireFn>,
    default: Option<DefaultFn>,
}

impl Parameter {
    /// Parameter of a concrete type that must be registered.
    pub fn of<T: Send + Sync + 'static>(name: &'static str) -> Self {
        Self {
            name,
            key: Some(key_of_type::<T>()),
            autowire: None,
            default: None,
        }
    }

    /// Parameter of an auto-wirable type; used as-is when registered,
    /// auto-wired (transient) otherwise.
    pub fn injectable<T: Injectable>(name: &'static str) -> Self {
        Self {
            name,
            key: Some(key_of_type::<T>()),
            autowire: Some(autowire::<T>),
            default: None,
        }
    }

    /// Parameter of a trait object type such as `dyn Logger`.
    pub fn of_trait<T: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self {
            name,
            key: Some(key_of_trait::<T>()),
            autowire: None,
            default: None,
        }
    }

    /// Parameter without a usable dependency key.
    ///
    /// Resolution fails unless a default is attached.
    pub fn untyped(name: &'static str) -> Self {
        Self {
            name,
            key: None,
            autowire: None,
            default: None,
        }
    }

    /// Attaches a default used when the key is missing or cannot be resolved.
    ///
    /// For trait object parameters the default must produce the
    /// `Arc<dyn Trait>` itself.
    pub fn with_default<T, F>(mut self, default: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(move || Arc::new(default()) as AnyArc));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_autowirable(&self) -> bool {
        self.autowire.is_some()
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("key", &self.key.map(|k| k.display_name()))
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// Resolved constructor arguments, in declaration order.
pub struct Arguments {
    owner: &'static str,
    values: VecDeque<(&'static str, AnyArc)>,
}

impl Arguments {
    /// Type the arguments are being resolved for.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes the argument for parameter `name`.
    pub fn take<T: Send + Sync + 'static>(&mut self, name: &'static str) -> DiResult<Arc<T>> {
        let value = self.remove(name)?;
        self.cast::<T>(name, value)
    }

    /// Takes the trait object argument for parameter `name`.
    pub fn take_trait<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &'static str,
    ) -> DiResult<Arc<T>> {
        let value = self.remove(name)?;
        self.cast::<Arc<T>>(name, value).map(|boxed| (*boxed).clone())
    }

    /// Takes the next argument in declaration order.
    pub fn next<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        let (name, value) = self.values.pop_front().ok_or_else(|| {
            DiError::unresolvable(self.owner, "constructor asked for more arguments than it declares")
        })?;
        self.cast::<T>(name, value)
    }

    fn remove(&mut self, name: &'static str) -> DiResult<AnyArc> {
        self.values
            .iter()
            .position(|(n, _)| *n == name)
            .and_then(|pos| self.values.remove(pos))
            .map(|(_, value)| value)
            .ok_or_else(|| {
                DiError::unresolvable_parameter(self.owner, name, "no such declared parameter")
            })
    }

    fn cast<T: Send + Sync + 'static>(&self, name: &'static str, value: AnyArc) -> DiResult<Arc<T>> {
        value.downcast::<T>().map_err(|_| {
            DiError::unresolvable_parameter(
                self.owner,
                name,
                format!("argument is not a {}", std::any::type_name::<T>()),
            )
        })
    }
}

/// Builds `T` by resolving each declared parameter through `ctx`.
///
/// This is the transient auto-wiring path for unregistered types, and the
/// builder behind `Bindings::bind_injectable`.
pub(crate) fn autowire<T: Injectable>(ctx: &ResolverContext<'_>) -> DiResult<AnyArc> {
    let owner = std::any::type_name::<T>();
    let parameters = T::parameters();

    let mut values = VecDeque::with_capacity(parameters.len());
    for parameter in &parameters {
        let value = resolve_parameter(owner, parameter, ctx)?;
        values.push_back((parameter.name, value));
    }

    let mut args = Arguments { owner, values };
    let instance = T::construct(&mut args).map_err(|e| DiError::from_builder(owner, e))?;
    Ok(Arc::new(instance))
}

fn resolve_parameter(
    owner: &'static str,
    parameter: &Parameter,
    ctx: &ResolverContext<'_>,
) -> DiResult<AnyArc> {
    let resolvable = parameter
        .key
        .filter(|key| parameter.autowire.is_some() || ctx.is_registered(key));

    match (resolvable, &parameter.default) {
        (Some(key), _) => ctx
            .resolve_any(&key, parameter.autowire)
            .map_err(|err| parameter_failure(owner, parameter.name, err)),
        (None, Some(default)) => Ok(default()),
        (None, None) => Err(match parameter.key {
            None => DiError::unresolvable_parameter(
                owner,
                parameter.name,
                "parameter declares no dependency key and has no default value",
            ),
            Some(key) => DiError::unresolvable_parameter(
                owner,
                parameter.name,
                format!("no registration for {} and it cannot be auto-wired", key),
            ),
        }),
    }
}

/// Cycles and scope violations surface unchanged; everything else names the
/// owner and parameter and keeps the original failure as its cause.
fn parameter_failure(owner: &'static str, parameter: &'static str, err: DiError) -> DiError {
    match err {
        DiError::CircularDependency { .. } | DiError::Scope(_) | DiError::Lifetime(_) => err,
        other => DiError::unresolvable_parameter(
            owner,
            parameter,
            format!("Failed to resolve dependency for parameter '{}'", parameter),
        )
        .caused_by(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Clock: Send + Sync {}
    struct Fixed;
    impl Clock for Fixed {}

    fn args(values: Vec<(&'static str, AnyArc)>) -> Arguments {
        Arguments { owner: "test::Owner", values: values.into() }
    }

    #[test]
    fn take_by_name_and_position() {
        let mut a = args(vec![
            ("port", Arc::new(8080u16) as AnyArc),
            ("host", Arc::new(String::from("localhost")) as AnyArc),
        ]);
        assert_eq!(*a.take::<String>("host").unwrap(), "localhost");
        assert_eq!(*a.next::<u16>().unwrap(), 8080);
        assert!(a.is_empty());
        assert!(a.next::<u16>().is_err());
    }

    #[test]
    fn take_reports_wrong_type_with_parameter() {
        let mut a = args(vec![("port", Arc::new(8080u16) as AnyArc)]);
        match a.take::<u32>("port") {
            Err(DiError::Unresolvable { owner, parameter, .. }) => {
                assert_eq!(owner, "test::Owner");
                assert_eq!(parameter, Some("port"));
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn trait_default_is_taken_as_trait_object() {
        let parameter = Parameter::of_trait::<dyn Clock>("clock")
            .with_default(|| Arc::new(Fixed) as Arc<dyn Clock>);
        let default = parameter.default.clone().unwrap();
        let mut a = args(vec![("clock", default())]);
        assert!(a.take_trait::<dyn Clock>("clock").is_ok());
    }

    #[test]
    fn parameter_metadata() {
        let p = Parameter::untyped("x").with_default(|| 3u8);
        assert_eq!(p.name(), "x");
        assert!(p.key().is_none());
        assert!(p.has_default());
        assert!(!p.is_autowirable());
    }
}
