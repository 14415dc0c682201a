//! How test bodies and hooks signal failure, and what the executor records.
//!
//! Bodies and hooks may return `()`, `Result<(), TestError>`,
//! `anyhow::Result<()>`, `Result<(), AssertionFailure>` or `Result<(), Skip>`.
//! Three conditions are distinguished:
//!
//! - an assertion failure ([`AssertionFailure`], or a panic from `assert!`)
//! - a skip ([`Skip`], typically from [`assume`])
//! - anything else, which is an unexpected error

use serde::{Deserialize, Serialize};
use std::any::Any;

/// An assertion did not hold
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AssertionFailure {
    /// What was expected
    pub message: String,
}

impl AssertionFailure {
    /// Create an assertion failure
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The test does not apply to its data and should be skipped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Skip {
    /// Why the test was skipped
    pub reason: String,
}

impl Skip {
    /// Create a skip signal
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Fail with `message` unless `condition` holds
///
/// # Errors
/// Returns [`AssertionFailure`] when `condition` is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), AssertionFailure> {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::new(message))
    }
}

/// Skip the test unless `condition` holds
///
/// # Errors
/// Returns [`Skip`] when `condition` is false.
pub fn assume(condition: bool, reason: impl Into<String>) -> Result<(), Skip> {
    if condition {
        Ok(())
    } else {
        Err(Skip::new(reason))
    }
}

/// Failure signalled by a test body or hook
#[derive(Debug)]
pub enum TestError {
    /// An assertion did not hold
    Failure(String),
    /// The test chose not to run to completion
    Skipped(String),
    /// Something the test did not anticipate
    Unexpected(anyhow::Error),
}

impl TestError {
    /// Assertion-style failure
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    /// Skip signal
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skipped(reason.into())
    }

    /// Unexpected error
    pub fn unexpected(error: impl Into<anyhow::Error>) -> Self {
        Self::Unexpected(error.into())
    }

    /// Classify an `anyhow` error, recognising wrapped [`AssertionFailure`] and [`Skip`]
    #[must_use]
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        if let Some(failure) = error.downcast_ref::<AssertionFailure>() {
            return Self::Failure(failure.message.clone());
        }
        if let Some(skip) = error.downcast_ref::<Skip>() {
            return Self::Skipped(skip.reason.clone());
        }
        Self::Unexpected(error)
    }

    /// Convert a caught panic payload into an assertion failure
    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::Failure(panic_message(payload))
    }

    /// Rendered cause for reports
    #[must_use]
    pub fn cause(&self) -> String {
        match self {
            Self::Failure(message) | Self::Skipped(message) => message.clone(),
            Self::Unexpected(error) => format!("{error:#}"),
        }
    }
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failure(message) => write!(f, "assertion failed: {message}"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
            Self::Unexpected(error) => write!(f, "unexpected error: {error:#}"),
        }
    }
}

// `TestError` deliberately does not implement `std::error::Error`, which keeps
// this blanket conversion coherent with `From<T> for T`.
impl<E> From<E> for TestError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::from_anyhow(anyhow::Error::new(error))
    }
}

/// Conversion of a body or hook return value into a test result
pub trait IntoTestResult {
    /// Normalise into `Result<(), TestError>`
    ///
    /// # Errors
    /// Returns the failure the body or hook signalled.
    fn into_test_result(self) -> Result<(), TestError>;
}

impl IntoTestResult for () {
    fn into_test_result(self) -> Result<(), TestError> {
        Ok(())
    }
}

impl IntoTestResult for Result<(), TestError> {
    fn into_test_result(self) -> Result<(), TestError> {
        self
    }
}

impl IntoTestResult for anyhow::Result<()> {
    fn into_test_result(self) -> Result<(), TestError> {
        self.map_err(TestError::from_anyhow)
    }
}

impl IntoTestResult for Result<(), AssertionFailure> {
    fn into_test_result(self) -> Result<(), TestError> {
        self.map_err(|failure| TestError::Failure(failure.message))
    }
}

impl IntoTestResult for Result<(), Skip> {
    fn into_test_result(self) -> Result<(), TestError> {
        self.map_err(|skip| TestError::Skipped(skip.reason))
    }
}

/// Whether a test is expected to pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// Normal test
    #[default]
    Pass,
    /// The body is declared to fail; passing is reported as a failure
    Failure,
}

/// Recorded result of one test execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Body completed without signalling failure
    Passed,
    /// An assertion failed in the body
    Failed {
        /// Failure message
        cause: String,
    },
    /// Unexpected error in the body or an after-hook
    Errored {
        /// Error chain
        cause: String,
    },
    /// Fixture construction, derivation or a before-hook failed
    SetupFailed {
        /// Error chain or panic message
        cause: String,
    },
    /// The body skipped itself
    Skipped {
        /// Why
        reason: String,
    },
    /// Marked as expected to fail, and it did
    ExpectedFailure {
        /// How it failed
        cause: String,
    },
    /// Marked as expected to fail, but passed
    UnexpectedPass,
    /// Excluded by the run filter; nothing was executed
    Filtered,
}

impl Outcome {
    /// Outcome for a body result, before expectations are applied
    pub(crate) fn from_body(result: Result<(), TestError>) -> Self {
        match result {
            Ok(()) => Self::Passed,
            Err(TestError::Failure(cause)) => Self::Failed { cause },
            Err(TestError::Skipped(reason)) => Self::Skipped { reason },
            Err(error @ TestError::Unexpected(_)) => Self::Errored {
                cause: error.cause(),
            },
        }
    }

    /// Apply the test's expectation marker
    #[must_use]
    pub(crate) fn expecting(self, expectation: Expectation) -> Self {
        match (expectation, self) {
            (Expectation::Pass, outcome) => outcome,
            (Expectation::Failure, Self::Passed) => Self::UnexpectedPass,
            (Expectation::Failure, Self::Failed { cause } | Self::Errored { cause }) => {
                Self::ExpectedFailure { cause }
            }
            (Expectation::Failure, outcome) => outcome,
        }
    }

    /// Fold a failed after-hook into the outcome so it always counts against the run
    ///
    /// Outcomes that already count keep their own cause with the teardown
    /// cause appended; any other outcome becomes `Errored`.
    #[must_use]
    pub(crate) fn with_teardown_failure(self, teardown: String) -> Self {
        match self {
            Self::Failed { cause } => Self::Failed {
                cause: format!("{cause}; then {teardown}"),
            },
            Self::Errored { cause } => Self::Errored {
                cause: format!("{cause}; then {teardown}"),
            },
            Self::SetupFailed { cause } => Self::SetupFailed {
                cause: format!("{cause}; then {teardown}"),
            },
            Self::UnexpectedPass => Self::Errored {
                cause: format!("passed unexpectedly; then {teardown}"),
            },
            Self::Passed | Self::Skipped { .. } | Self::ExpectedFailure { .. } | Self::Filtered => {
                Self::Errored { cause: teardown }
            }
        }
    }

    /// Counts against the run
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Failed { .. } | Self::Errored { .. } | Self::SetupFailed { .. } | Self::UnexpectedPass
        )
    }

    /// Short lowercase label used in reports
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Errored { .. } => "errored",
            Self::SetupFailed { .. } => "setup failed",
            Self::Skipped { .. } => "skipped",
            Self::ExpectedFailure { .. } => "expected failure",
            Self::UnexpectedPass => "unexpected pass",
            Self::Filtered => "filtered",
        }
    }

    /// Failure cause or skip reason, if any
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Failed { cause }
            | Self::Errored { cause }
            | Self::SetupFailed { cause }
            | Self::ExpectedFailure { cause } => Some(cause),
            Self::Skipped { reason } => Some(reason),
            Self::Passed | Self::UnexpectedPass | Self::Filtered => None,
        }
    }
}

/// Extract a message from a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk on fire")]
    struct DiskError;

    fn failing_step() -> Result<u32, DiskError> {
        Err(DiskError)
    }

    fn io_body() -> Result<(), TestError> {
        let _ = failing_step()?;
        Ok(())
    }

    #[test]
    fn std_errors_are_unexpected() {
        let err = io_body().unwrap_err();
        assert!(matches!(err, TestError::Unexpected(_)));
        assert_eq!(err.cause(), "disk on fire");
    }

    #[test]
    fn assertion_failures_survive_question_mark() {
        let body = || -> Result<(), TestError> {
            ensure(1 + 1 == 3, "arithmetic is broken")?;
            Ok(())
        };
        assert!(matches!(body(), Err(TestError::Failure(m)) if m == "arithmetic is broken"));
    }

    #[test]
    fn anyhow_results_are_classified() {
        let failed: anyhow::Result<()> = Err(AssertionFailure::new("nope").into());
        let skipped: anyhow::Result<()> = Err(Skip::new("not divisible").into());
        let errored: anyhow::Result<()> = Err(anyhow::anyhow!("boom"));

        assert!(matches!(failed.into_test_result(), Err(TestError::Failure(_))));
        assert!(matches!(skipped.into_test_result(), Err(TestError::Skipped(_))));
        assert!(matches!(errored.into_test_result(), Err(TestError::Unexpected(_))));
    }

    #[test]
    fn expectation_flips_pass_and_fail() {
        let failed = Outcome::Failed { cause: "x".into() };
        assert_eq!(
            failed.expecting(Expectation::Failure),
            Outcome::ExpectedFailure { cause: "x".into() }
        );
        assert_eq!(
            Outcome::Passed.expecting(Expectation::Failure),
            Outcome::UnexpectedPass
        );
        let skipped = Outcome::Skipped { reason: "r".into() };
        assert_eq!(skipped.clone().expecting(Expectation::Failure), skipped);
    }

    #[test]
    fn failure_classification() {
        assert!(!Outcome::Passed.is_failure());
        assert!(!Outcome::Filtered.is_failure());
        assert!(!Outcome::ExpectedFailure { cause: String::new() }.is_failure());
        assert!(Outcome::UnexpectedPass.is_failure());
        assert!(Outcome::SetupFailed { cause: String::new() }.is_failure());
    }

    #[test]
    fn teardown_failure_always_counts() {
        let teardown = || "after-hook in `root` failed: leak".to_string();
        for outcome in [
            Outcome::Passed,
            Outcome::Skipped { reason: "r".into() },
            Outcome::ExpectedFailure { cause: "x".into() },
            Outcome::UnexpectedPass,
        ] {
            let folded = outcome.with_teardown_failure(teardown());
            assert!(matches!(folded, Outcome::Errored { .. }), "{folded:?}");
        }

        assert_eq!(
            Outcome::Failed { cause: "x".into() }.with_teardown_failure(teardown()),
            Outcome::Failed {
                cause: "x; then after-hook in `root` failed: leak".into()
            }
        );
        assert!(Outcome::SetupFailed { cause: "y".into() }
            .with_teardown_failure(teardown())
            .detail()
            .is_some_and(|cause| cause.ends_with("leak")));
    }

    #[test]
    fn panic_payloads_render() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("left != right"));
        assert_eq!(panic_message(payload.as_ref()), "left != right");
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(payload.as_ref()), "panic with non-string payload");
    }
}
