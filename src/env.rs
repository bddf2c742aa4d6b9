//! Environment variable abstraction for testability.
//!
//! Production code uses [`Env::real()`] which delegates to [`std::env::var`].
//! Tests use [`Env::mock()`] backed by a `HashMap`, so config tests never
//! touch the process environment.

use std::collections::HashMap;
use std::str::FromStr;

/// Environment variable reader.
#[derive(Clone, Debug)]
pub struct Env {
    overrides: Option<HashMap<String, String>>,
}

impl Env {
    /// Create an `Env` that reads from the real process environment.
    pub fn real() -> Self {
        Self { overrides: None }
    }

    /// Create an `Env` backed by explicit key-value pairs.
    pub fn mock(vars: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            overrides: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Look up an environment variable by name.
    pub fn var(&self, name: &str) -> Result<String, std::env::VarError> {
        match &self.overrides {
            Some(map) => map.get(name).cloned().ok_or(std::env::VarError::NotPresent),
            None => std::env::var(name),
        }
    }

    /// Look up and parse a variable.
    ///
    /// Returns `None` when unset. A value that fails to parse is reported
    /// on stderr and treated as unset.
    pub fn parsed<T: FromStr>(&self, name: &str) -> Option<T> {
        let raw = self.var(name).ok()?;
        match raw.trim().parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                eprintln!("Warning: ignoring invalid {name} value: {raw}");
                None
            }
        }
    }

    /// Look up a boolean flag (`true/1/yes/on`, `false/0/no/off`).
    pub fn flag(&self, name: &str) -> Option<bool> {
        let raw = self.var(name).ok()?;
        match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => {
                eprintln!("Warning: ignoring invalid {name} value: {raw}");
                None
            }
        }
    }

    /// Look up a comma-separated list. Entries are trimmed; empty entries dropped.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.var(name).ok().map(|raw| split_list(&raw))
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::real()
    }
}

/// Split a comma-separated pattern list.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_env_reads_cargo_manifest_dir() {
        let env = Env::real();
        assert!(env.var("CARGO_MANIFEST_DIR").is_ok());
    }

    #[test]
    fn mock_env_returns_not_present_for_missing() {
        let env = Env::mock(Vec::<(&str, &str)>::new());
        assert!(env.var("NONEXISTENT").is_err());
        assert_eq!(env.parsed::<usize>("NONEXISTENT"), None);
    }

    #[test]
    fn parsed_accepts_numbers_and_rejects_garbage() {
        let env = Env::mock([("GOOD", " 42 "), ("BAD", "forty-two")]);
        assert_eq!(env.parsed::<usize>("GOOD"), Some(42));
        assert_eq!(env.parsed::<usize>("BAD"), None);
    }

    #[test]
    fn flag_understands_common_spellings() {
        let env = Env::mock([("A", "TRUE"), ("B", "off"), ("C", "maybe")]);
        assert_eq!(env.flag("A"), Some(true));
        assert_eq!(env.flag("B"), Some(false));
        assert_eq!(env.flag("C"), None);
    }

    #[test]
    fn list_splits_and_trims() {
        let env = Env::mock([("PATTERNS", "*.py, *.rs,, *.md ")]);
        assert_eq!(
            env.list("PATTERNS"),
            Some(vec!["*.py".to_string(), "*.rs".to_string(), "*.md".to_string()])
        );
    }
}
