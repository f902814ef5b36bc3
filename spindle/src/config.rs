//! Injected configuration-reader capability.
//!
//! Ambient process state (named values, installation root) is read through
//! [`ConfigSource`] rather than true globals so the chain is deterministic
//! under test: swap in a [`MapSource`] and no environment is touched.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use thiserror::Error;

/// Default environment variable naming the installation root.
pub const DEFAULT_HOME_KEY: &str = "SPINDLE_HOME";

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The value exists but cannot be read (non-unicode contents, or an
    /// access-restricted store).
    #[error("configuration value {key} is not readable")]
    Unreadable { key: String },
}

/// Read-only view of process-wide configuration.
pub trait ConfigSource: Send + Sync {
    /// Named process-wide value. `Ok(None)` when unset; `Err` when present
    /// but unreadable.
    fn value(&self, key: &str) -> Result<Option<String>, ConfigError>;

    /// Installation root for `<root>/lib/<file>` lookups.
    fn install_root(&self) -> Option<PathBuf>;
}

/// Configuration from the process environment.
pub struct ProcessEnv {
    home_key: String,
}

impl ProcessEnv {
    pub fn new() -> Self {
        Self {
            home_key: DEFAULT_HOME_KEY.to_string(),
        }
    }

    /// Use a different environment variable for the installation root.
    pub fn with_home_key(mut self, key: impl Into<String>) -> Self {
        self.home_key = key.into();
        self
    }
}

impl Default for ProcessEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for ProcessEnv {
    fn value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        match std::env::var(key) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::Unreadable {
                key: key.to_string(),
            }),
        }
    }

    fn install_root(&self) -> Option<PathBuf> {
        std::env::var_os(&self.home_key).map(PathBuf::from)
    }
}

/// In-memory configuration for tests.
#[derive(Default)]
pub struct MapSource {
    values: HashMap<String, String>,
    unreadable: HashSet<String>,
    root: Option<PathBuf>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Mark a key as present but unreadable.
    pub fn with_unreadable(mut self, key: impl Into<String>) -> Self {
        self.unreadable.insert(key.into());
        self
    }

    pub fn with_install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }
}

impl ConfigSource for MapSource {
    fn value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        if self.unreadable.contains(key) {
            return Err(ConfigError::Unreadable {
                key: key.to_string(),
            });
        }
        Ok(self.values.get(key).cloned())
    }

    fn install_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_env_reads_values() {
        std::env::set_var("SPINDLE_CONFIG_TEST_KEY", "acme::Builder");
        let env = ProcessEnv::new();
        assert_eq!(
            env.value("SPINDLE_CONFIG_TEST_KEY").unwrap().as_deref(),
            Some("acme::Builder")
        );
        std::env::remove_var("SPINDLE_CONFIG_TEST_KEY");
        assert_eq!(env.value("SPINDLE_CONFIG_TEST_KEY").unwrap(), None);
    }

    #[test]
    fn process_env_install_root_from_home_key() {
        std::env::set_var("SPINDLE_CONFIG_TEST_HOME", "/opt/acme");
        let env = ProcessEnv::new().with_home_key("SPINDLE_CONFIG_TEST_HOME");
        assert_eq!(env.install_root(), Some(PathBuf::from("/opt/acme")));
        std::env::remove_var("SPINDLE_CONFIG_TEST_HOME");
        assert_eq!(env.install_root(), None);
    }

    #[test]
    fn map_source_unreadable_key_errors() {
        let source = MapSource::new()
            .with_value("a", "1")
            .with_unreadable("secret");
        assert_eq!(source.value("a").unwrap().as_deref(), Some("1"));
        assert!(matches!(
            source.value("secret"),
            Err(ConfigError::Unreadable { .. })
        ));
        assert_eq!(source.value("absent").unwrap(), None);
    }
}
