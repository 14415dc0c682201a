//! Error types for ctxtest
//!
//! Build-time errors only. Per-test failures never surface as `Err`; the
//! executor converts them into [`Outcome`](crate::outcome::Outcome) values.

use std::path::PathBuf;

/// A conflicting or incomplete declaration on a single context or test
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeclarationError {
    /// `fixture` or `derive_fixture` called twice on one context
    #[error("{kind} declared more than once")]
    DuplicateFixture {
        /// Which declaration was repeated
        kind: FixtureKind,
    },

    /// A constructor and a deriver declared on the same context
    #[error("context declares both a fixture constructor and a fixture deriver")]
    ConflictingFixture,

    /// The context changes fixture type but declares no way to produce it
    #[error("context changes fixture type from `{parent}` to `{fixture}` without a constructor or deriver")]
    MissingFixture {
        /// Parent fixture type name
        parent: &'static str,
        /// This context's fixture type name
        fixture: &'static str,
    },

    /// Contexts and tests need a name for reporting
    #[error("{node} name must not be empty")]
    EmptyName {
        /// `"context"` or `"test"`
        node: &'static str,
    },
}

/// Kind of fixture declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    /// A constructor ignoring the inherited fixture
    Constructor,
    /// A deriver transforming the inherited fixture
    Deriver,
}

impl std::fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constructor => f.write_str("fixture constructor"),
            Self::Deriver => f.write_str("fixture deriver"),
        }
    }
}

/// A declaration error together with the context path it was found at
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid declaration at `{}`: {source}", .path.join(" / "))]
pub struct BuildError {
    /// Context names from the root to the offending node
    pub path: Vec<String>,
    /// What was wrong
    #[source]
    pub source: DeclarationError,
}

impl BuildError {
    /// Attach a path to a declaration error
    #[must_use]
    pub fn new(path: Vec<String>, source: DeclarationError) -> Self {
        Self { path, source }
    }
}

/// Run configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for [`RunConfig`](crate::config::RunConfig)
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_display_includes_path() {
        let err = BuildError::new(
            vec!["root".into(), "non-empty".into()],
            DeclarationError::ConflictingFixture,
        );
        let text = err.to_string();
        assert!(text.contains("root / non-empty"));
        assert!(text.contains("both a fixture constructor and a fixture deriver"));
    }

    #[test]
    fn duplicate_fixture_names_kind() {
        let err = DeclarationError::DuplicateFixture {
            kind: FixtureKind::Deriver,
        };
        assert_eq!(err.to_string(), "fixture deriver declared more than once");
    }
}
