//! Container configuration.
//!
//! Options can be built in code, read from the environment, or (with the
//! `config` feature) deserialized from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::internal::DEFAULT_MAX_DEPTH;

/// Environment variable holding the maximum resolution depth.
pub const MAX_DEPTH_ENV: &str = "SCOPEWIRE_MAX_DEPTH";

/// Environment variable toggling the undisposed-resource warning.
pub const WARN_ON_UNDISPOSED_ENV: &str = "SCOPEWIRE_WARN_ON_UNDISPOSED";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable or field held a value that cannot be used
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
    /// The JSON document could not be parsed
    #[cfg(feature = "config")]
    #[error("invalid container configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runtime options for a [`Container`](crate::Container).
///
/// # Examples
///
/// ```
/// use scopewire::{Container, ContainerOptions};
///
/// let options = ContainerOptions::new()
///     .max_depth(64)
///     .warn_on_undisposed(false);
/// let container = Container::with_options(options);
/// assert_eq!(container.options().max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Longest resolution path before resolution fails as unresolvable
    pub max_depth: usize,
    /// Log a warning when a scope or container is dropped with disposal
    /// hooks that never ran
    pub warn_on_undisposed: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            warn_on_undisposed: true,
        }
    }
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn warn_on_undisposed(mut self, warn: bool) -> Self {
        self.warn_on_undisposed = warn;
        self
    }

    /// Reads options from `SCOPEWIRE_*` environment variables, keeping the
    /// default for any variable that is unset.
    ///
    /// Set but unusable values are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut options = Self::default();

        if let Some(raw) = read_var(MAX_DEPTH_ENV) {
            options.max_depth = parse_depth(MAX_DEPTH_ENV, &raw)?;
        }
        if let Some(raw) = read_var(WARN_ON_UNDISPOSED_ENV) {
            options.warn_on_undisposed = parse_flag(WARN_ON_UNDISPOSED_ENV, &raw)?;
        }

        tracing::debug!(?options, "container options loaded from environment");
        Ok(options)
    }

    /// Parses options from a JSON document. Missing fields keep their
    /// defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_depth",
                value: self.max_depth.to_string(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_depth(name: &'static str, raw: &str) -> Result<usize, ConfigError> {
    let depth = raw.trim().parse::<usize>().map_err(|e| ConfigError::InvalidValue {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    ContainerOptions::new().max_depth(depth).validate()?;
    Ok(depth)
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name,
            value: raw.to_string(),
            reason: "expected true or false".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("X", " Yes ").unwrap());
        assert!(!parse_flag("X", "0").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }

    #[test]
    fn zero_depth_is_rejected() {
        let err = parse_depth("X", "0").unwrap_err();
        assert!(err.to_string().contains("must be at least 1"));
        assert_eq!(parse_depth("X", "32").unwrap(), 32);
        assert!(parse_depth("X", "-3").is_err());
    }

    #[cfg(feature = "config")]
    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let options = ContainerOptions::from_json(r#"{ "max_depth": 8 }"#).unwrap();
        assert_eq!(options.max_depth, 8);
        assert!(options.warn_on_undisposed);
        assert!(ContainerOptions::from_json(r#"{ "max_depth": 0 }"#).is_err());
    }
}
