//! Run results handed to the reporting sink
//!
//! Formatting beyond [`RunReport::to_text`] is left to consumers; every type
//! here serializes with serde.

use crate::outcome::Outcome;
use crate::tree::{TestId, TestPath};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;
use uuid::Uuid;

/// Identifier of one executor run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Fresh random run id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Result of executing one test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Positional id, unique within the tree
    pub id: TestId,
    /// Context names and test name
    pub path: TestPath,
    /// What happened
    pub outcome: Outcome,
    /// Wall time spent on fixture, hooks and body
    pub elapsed: Duration,
}

/// Outcome counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records in the report
    pub total: usize,
    /// `Passed`
    pub passed: usize,
    /// `Failed`
    pub failed: usize,
    /// `Errored`
    pub errored: usize,
    /// `SetupFailed`
    pub setup_failed: usize,
    /// `Skipped`
    pub skipped: usize,
    /// `ExpectedFailure`
    pub expected_failures: usize,
    /// `UnexpectedPass`
    pub unexpected_passes: usize,
    /// `Filtered`
    pub filtered: usize,
}

impl RunSummary {
    /// Tally a sequence of records
    #[must_use]
    pub fn from_records(records: &[TestRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            match record.outcome {
                Outcome::Passed => summary.passed += 1,
                Outcome::Failed { .. } => summary.failed += 1,
                Outcome::Errored { .. } => summary.errored += 1,
                Outcome::SetupFailed { .. } => summary.setup_failed += 1,
                Outcome::Skipped { .. } => summary.skipped += 1,
                Outcome::ExpectedFailure { .. } => summary.expected_failures += 1,
                Outcome::UnexpectedPass => summary.unexpected_passes += 1,
                Outcome::Filtered => summary.filtered += 1,
            }
        }
        summary
    }

    /// Records that count against the run
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failed + self.errored + self.setup_failed + self.unexpected_passes
    }
}

/// Everything an executor run produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: RunId,
    /// Name of the tree's root context
    pub suite: String,
    /// One record per executed test, in declaration order
    pub records: Vec<TestRecord>,
    /// Outcome counts
    pub summary: RunSummary,
    /// Whether the run stopped before every test was recorded
    pub cancelled: bool,
    /// Wall time of the whole run
    pub elapsed: Duration,
}

impl RunReport {
    /// No failures and not cancelled
    #[must_use]
    pub fn passed(&self) -> bool {
        !self.cancelled && self.summary.failures() == 0
    }

    /// Records that count against the run
    pub fn failures(&self) -> impl Iterator<Item = &TestRecord> {
        self.records.iter().filter(|record| record.outcome.is_failure())
    }

    /// Find a record by its rendered path
    #[must_use]
    pub fn record(&self, path: &str) -> Option<&TestRecord> {
        self.records.iter().find(|record| record.path.to_string() == path)
    }

    /// Human-readable report, one line per test in declaration order
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== {} ({}) ===", self.suite, self.run_id);
        for record in &self.records {
            let mark = match record.outcome {
                Outcome::Passed | Outcome::ExpectedFailure { .. } => "ok",
                Outcome::Skipped { .. } | Outcome::Filtered => "--",
                _ => "XX",
            };
            let _ = write!(out, "[{mark}] {} ({})", record.path, record.outcome.label());
            if let Some(detail) = record.outcome.detail() {
                let _ = write!(out, ": {detail}");
            }
            out.push('\n');
        }

        let s = &self.summary;
        let _ = writeln!(
            out,
            "\n{} tests: {} passed, {} failed, {} errored, {} setup failed, {} skipped, \
             {} expected failures, {} unexpected passes, {} filtered",
            s.total,
            s.passed,
            s.failed,
            s.errored,
            s.setup_failed,
            s.skipped,
            s.expected_failures,
            s.unexpected_passes,
            s.filtered,
        );
        if self.cancelled {
            out.push_str("run cancelled before completion\n");
        }
        let _ = writeln!(
            out,
            "=== Result: {} ===",
            if self.passed() { "PASS" } else { "FAIL" }
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(test: &str, outcome: Outcome) -> TestRecord {
        TestRecord {
            id: TestId(vec![0]),
            path: TestPath {
                contexts: vec!["suite".into()],
                test: test.into(),
            },
            outcome,
            elapsed: Duration::ZERO,
        }
    }

    fn report(records: Vec<TestRecord>) -> RunReport {
        RunReport {
            run_id: RunId::new(),
            suite: "suite".into(),
            summary: RunSummary::from_records(&records),
            records,
            cancelled: false,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn summary_counts_each_outcome() {
        let report = report(vec![
            record("a", Outcome::Passed),
            record("b", Outcome::Failed { cause: "x".into() }),
            record("c", Outcome::Skipped { reason: "y".into() }),
            record("d", Outcome::UnexpectedPass),
            record("e", Outcome::ExpectedFailure { cause: "z".into() }),
        ]);
        assert_eq!(report.summary.total, 5);
        assert_eq!(report.summary.passed, 1);
        assert_eq!(report.summary.failures(), 2);
        assert!(!report.passed());
        assert_eq!(report.failures().count(), 2);
    }

    #[test]
    fn cancelled_run_does_not_pass() {
        let mut report = report(vec![record("a", Outcome::Passed)]);
        assert!(report.passed());
        report.cancelled = true;
        assert!(!report.passed());
    }

    #[test]
    fn text_lists_every_record() {
        let report = report(vec![
            record("a", Outcome::Passed),
            record("b", Outcome::Errored { cause: "boom".into() }),
        ]);
        let text = report.to_text();
        assert!(text.contains("[ok] suite / a (passed)"));
        assert!(text.contains("[XX] suite / b (errored): boom"));
        assert!(text.ends_with("=== Result: FAIL ===\n"));
    }

    #[test]
    fn json_tags_outcomes() {
        let report = report(vec![record("a", Outcome::Failed { cause: "x".into() })]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["records"][0]["outcome"]["status"], "failed");
        assert_eq!(json["records"][0]["path"]["test"], "a");
        assert_eq!(json["summary"]["failed"], 1);
    }

    #[test]
    fn lookup_by_path() {
        let report = report(vec![record("a", Outcome::Passed)]);
        assert!(report.record("suite / a").is_some());
        assert!(report.record("suite / b").is_none());
    }
}
