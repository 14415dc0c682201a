//! Testing utilities for the ctxtest workspace
//!
//! Shared probes, counters and canned trees.

#![allow(missing_docs)]

use ctxtest_core::{Outcome, RunReport, TestTree};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Records labelled events from hooks, bodies and fixtures, in call order
#[derive(Debug, Clone, Default)]
pub struct Probe {
    events: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Closure recording `event` each time it is called with any argument
    pub fn marker<T: ?Sized>(&self, event: &str) -> impl Fn(&mut T) + Send + Sync + 'static {
        let probe = self.clone();
        let event = event.to_string();
        move |_| probe.record(event.clone())
    }
}

/// Monotonic counter, for fixtures whose construction must be observably fresh
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value, then increment
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst)
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// `root -> mid -> leaf`, each with one before- and one after-hook, and one
/// test under `leaf`
pub fn nested_hook_tree(probe: &Probe) -> TestTree {
    TestTree::build("root", |root| {
        root.before(probe.marker("root.before"));
        root.after(probe.marker("root.after"));
        root.context("mid", |mid| {
            mid.before(probe.marker("mid.before"));
            mid.after(probe.marker("mid.after"));
            mid.context("leaf", |leaf| {
                leaf.before(probe.marker("leaf.before"));
                leaf.after(probe.marker("leaf.after"));
                leaf.test("body", probe.marker("body"));
            });
        });
    })
    .unwrap()
}

/// `(rendered path, outcome label)` for every record
pub fn outcome_table(report: &RunReport) -> Vec<(String, &'static str)> {
    report
        .records
        .iter()
        .map(|record| (record.path.to_string(), record.outcome.label()))
        .collect()
}

/// Outcome of the record at `path`, panicking with the available paths if absent
pub fn outcome_at<'r>(report: &'r RunReport, path: &str) -> &'r Outcome {
    match report.record(path) {
        Some(record) => &record.outcome,
        None => panic!(
            "no record at `{path}`; have {:?}",
            outcome_table(report)
        ),
    }
}
