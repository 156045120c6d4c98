//! `${VAR}` substitution for step values
//!
//! Only a value that is exactly one placeholder token is substituted. Embedded
//! placeholders such as `pre${FOO}post` pass through untouched.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$\{([A-Z0-9_]+)\}$").expect("placeholder pattern is valid"));

/// Source of environment variable values
pub trait EnvSource {
    /// Look up a variable; `None` when unset
    fn var(&self, name: &str) -> Option<String>;

    /// Substitute `value` if it is a whole-string placeholder.
    ///
    /// An unset or empty variable is an error.
    fn substitute(&self, value: &str) -> Result<String> {
        let Some(name) = placeholder_name(value) else {
            return Ok(value.to_string());
        };

        match self.var(name) {
            Some(resolved) if !resolved.is_empty() => {
                debug!(variable = name, "Resolved placeholder");
                Ok(resolved)
            }
            _ => Err(Error::MissingEnvironmentVariable {
                name: name.to_string(),
            }),
        }
    }
}

impl<T: EnvSource + ?Sized> EnvSource for Arc<T> {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

impl<T: EnvSource + ?Sized> EnvSource for &T {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// Reads the live process environment on every lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Immutable set of variables
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for EnvSnapshot {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// The variable named by a whole-string placeholder, if `value` is one
pub fn placeholder_name(value: &str) -> Option<&str> {
    PLACEHOLDER
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Substitute against the process environment
pub fn substitute_env(value: &str) -> Result<String> {
    ProcessEnv.substitute(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_substitute_from_process_env() {
        std::env::set_var("PLANGUARD_TEST_FOO", "bar");
        assert_eq!(substitute_env("${PLANGUARD_TEST_FOO}").unwrap(), "bar");
    }

    #[test]
    fn test_unset_variable_is_missing() {
        std::env::remove_var("PLANGUARD_TEST_UNSET");
        let err = substitute_env("${PLANGUARD_TEST_UNSET}").unwrap_err();
        assert!(matches!(
            err,
            Error::MissingEnvironmentVariable { ref name } if name == "PLANGUARD_TEST_UNSET"
        ));
    }

    #[test]
    fn test_empty_variable_is_missing() {
        let env: EnvSnapshot = [("PASS", "")].into_iter().collect();
        assert!(env.substitute("${PASS}").is_err());
    }

    #[test_case("hello" ; "plain text")]
    #[test_case("pre${FOO}post" ; "embedded placeholder")]
    #[test_case("${FOO} " ; "trailing space")]
    #[test_case("${foo}" ; "lowercase name")]
    #[test_case("$FOO" ; "no braces")]
    #[test_case("" ; "empty string")]
    fn test_passthrough(value: &str) {
        let env: EnvSnapshot = [("FOO", "bar"), ("foo", "bar")].into_iter().collect();
        assert_eq!(env.substitute(value).unwrap(), value);
    }

    #[test]
    fn test_placeholder_name() {
        assert_eq!(placeholder_name("${VALID_USERNAME}"), Some("VALID_USERNAME"));
        assert_eq!(placeholder_name("${A1_B2}"), Some("A1_B2"));
        assert_eq!(placeholder_name("x${A}"), None);
    }

    #[test]
    fn test_process_env_is_not_cached() {
        std::env::set_var("PLANGUARD_TEST_LIVE", "first");
        assert_eq!(ProcessEnv.substitute("${PLANGUARD_TEST_LIVE}").unwrap(), "first");

        std::env::remove_var("PLANGUARD_TEST_LIVE");
        assert!(ProcessEnv.substitute("${PLANGUARD_TEST_LIVE}").is_err());
    }
}
