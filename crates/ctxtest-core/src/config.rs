//! Run configuration
//!
//! ```toml
//! parallel = false
//! filter = "non-empty"
//! catch_panics = true
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the executor runs a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Execute tests on the rayon pool; records keep declaration order
    pub parallel: bool,
    /// Only run tests whose rendered path contains this text
    pub filter: Option<String>,
    /// Convert panics in fixtures, hooks and bodies into outcomes
    pub catch_panics: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            filter: None,
            catch_panics: true,
        }
    }
}

impl RunConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With parallel execution
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// With a path filter
    #[inline]
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// With panic catching switched on or off
    #[inline]
    #[must_use]
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    /// Parse TOML
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed text or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Whether a rendered test path passes the filter
    #[must_use]
    pub fn selects(&self, rendered_path: &str) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |filter| rendered_path.contains(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sequential_and_catch_panics() {
        let config = RunConfig::default();
        assert!(!config.parallel);
        assert!(config.catch_panics);
        assert!(config.selects("anything"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config = RunConfig::from_toml_str("filter = \"non-empty\"").unwrap();
        assert_eq!(config.filter.as_deref(), Some("non-empty"));
        assert!(config.catch_panics);
        assert!(config.selects("stack / non-empty / push"));
        assert!(!config.selects("stack / empty / pop"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RunConfig::from_toml_str("retries = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "parallel = true").unwrap();
        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config, RunConfig::new().with_parallel(true));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RunConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
