//! Execution Phase
//!
//! The executor only accepts a built [`TestTree`]; no declaration checks
//! happen here.
//!
//! # Critical Invariant
//!
//! Nothing a test does escapes its own execution. For every test the executor:
//! - Replays the fixture chain from the root (fresh fixtures, never cached)
//! - Runs before-hooks root to leaf, the body, then after-hooks leaf to root
//! - Converts every failure into an [`Outcome`]
//!
//! and then moves on to the next test, whatever happened.

pub mod state;

use crate::config::RunConfig;
use crate::fixture::FixtureStack;
use crate::outcome::{Outcome, TestError};
use crate::report::{RunId, RunReport, RunSummary, TestRecord};
use crate::tree::{PlannedTest, TestTree};
use rayon::prelude::*;
use state::{RunEvent, RunState, StateTracker};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Request to stop a run between two tests
///
/// A test already executing finishes, including its after-hooks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New, not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop starting new tests
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](Self::cancel) was called
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

type Observer = Arc<dyn Fn(&RunEvent) + Send + Sync>;

/// Tree executor
pub struct Executor {
    config: RunConfig,
    observer: Option<Observer>,
}

impl Executor {
    /// Create an executor
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Receive progress events; called from worker threads in parallel runs
    #[must_use]
    pub fn with_observer(mut self, observer: impl Fn(&RunEvent) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run every test in the tree
    #[must_use]
    pub fn run(&self, tree: &TestTree) -> RunReport {
        self.run_with_cancel(tree, &CancelToken::new())
    }

    /// Run every test until `cancel` is set
    ///
    /// Tests not started before cancellation have no record, and the report
    /// is marked cancelled.
    #[must_use]
    pub fn run_with_cancel(&self, tree: &TestTree, cancel: &CancelToken) -> RunReport {
        let run_id = RunId::new();
        let started = Instant::now();
        let span = tracing::info_span!("run", suite = %tree.root.name, %run_id);
        let _enter = span.enter();

        let plan = tree.plan();
        tracing::info!(tests = plan.len(), parallel = self.config.parallel, "run started");
        self.notify(&RunEvent::RunStarted { total: plan.len() });

        let records: Vec<TestRecord> = if self.config.parallel {
            plan.par_iter()
                .map(|planned| (!cancel.is_cancelled()).then(|| self.execute(planned)))
                .collect::<Vec<_>>()
                .into_iter()
                .flatten()
                .collect()
        } else {
            let mut records = Vec::with_capacity(plan.len());
            for planned in &plan {
                if cancel.is_cancelled() {
                    break;
                }
                records.push(self.execute(planned));
            }
            records
        };

        let cancelled = records.len() < plan.len();
        let summary = RunSummary::from_records(&records);
        if cancelled {
            tracing::warn!(recorded = records.len(), tests = plan.len(), "run cancelled");
        }
        tracing::info!(
            passed = summary.passed,
            failures = summary.failures(),
            skipped = summary.skipped,
            "run completed"
        );
        self.notify(&RunEvent::RunCompleted {
            recorded: records.len(),
            cancelled,
        });

        RunReport {
            run_id,
            suite: tree.root.name.clone(),
            records,
            summary,
            cancelled,
            elapsed: started.elapsed(),
        }
    }

    fn notify(&self, event: &RunEvent) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }

    /// Execute one test and record its outcome
    fn execute(&self, planned: &PlannedTest<'_>) -> TestRecord {
        let started = Instant::now();
        let span = tracing::debug_span!("test", id = %planned.id);
        let _enter = span.enter();

        let notify = |event: &RunEvent| self.notify(event);
        let mut tracker = StateTracker::new(planned.id.clone(), &notify);

        let outcome = if self.config.selects(&planned.path.to_string()) {
            tracing::debug!(path = %planned.path, "test started");
            self.notify(&RunEvent::TestStarted {
                id: planned.id.clone(),
                path: planned.path.clone(),
            });
            self.run_test(planned, &mut tracker)
        } else {
            Outcome::Filtered
        };
        tracker.advance(RunState::Recorded);

        match &outcome {
            Outcome::SetupFailed { cause } => {
                tracing::warn!(path = %planned.path, %cause, "fixture setup failed");
            }
            Outcome::Errored { cause } => {
                tracing::warn!(path = %planned.path, %cause, "test errored");
            }
            other => tracing::debug!(path = %planned.path, outcome = other.label(), "test recorded"),
        }

        let record = TestRecord {
            id: planned.id.clone(),
            path: planned.path.clone(),
            outcome,
            elapsed: started.elapsed(),
        };
        self.notify(&RunEvent::TestRecorded(record.clone()));
        record
    }

    /// Fixture chain, before-hooks, body, after-hooks
    fn run_test(&self, planned: &PlannedTest<'_>, tracker: &mut StateTracker<'_>) -> Outcome {
        let catch = self.config.catch_panics;

        tracker.advance(RunState::ResolvingFixture);
        let mut fixtures = match FixtureStack::resolve(&planned.chain, catch) {
            Ok(fixtures) => fixtures,
            Err(cause) => return Outcome::SetupFailed { cause },
        };
        tracing::trace!(slots = fixtures.slot_count(), "fixtures resolved");

        tracker.advance(RunState::RunningBeforeHooks);
        // A context is entered once its first before-hook starts; entered
        // contexts get their after-hooks even if a later before-hook fails.
        let mut entered = 0;
        let mut setup_outcome = None;
        'contexts: for (level, context) in planned.chain.iter().enumerate() {
            entered = level + 1;
            for hook in &context.before {
                if let Err(error) = invoke(catch, || hook(fixtures.level_mut(level))) {
                    setup_outcome = Some(match error {
                        TestError::Skipped(reason) => Outcome::Skipped { reason },
                        error => Outcome::SetupFailed {
                            cause: format!("before-hook in `{}` failed: {}", context.name, error.cause()),
                        },
                    });
                    break 'contexts;
                }
            }
        }

        let outcome = if let Some(outcome) = setup_outcome {
            outcome
        } else {
            tracker.advance(RunState::RunningBody);
            let test = planned.test;
            let result = invoke(catch, || (test.body)(fixtures.leaf_mut()));
            Outcome::from_body(result).expecting(test.expectation)
        };

        tracker.advance(RunState::RunningAfterHooks);
        let mut teardown_failure = None;
        for (level, context) in planned.chain[..entered].iter().enumerate().rev() {
            for hook in &context.after {
                if let Err(error) = invoke(catch, || hook(fixtures.level_mut(level))) {
                    let cause = format!("after-hook in `{}` failed: {}", context.name, error.cause());
                    tracing::warn!(path = %planned.path, %cause, "teardown failed");
                    teardown_failure.get_or_insert(cause);
                }
            }
        }
        drop(fixtures);

        match teardown_failure {
            Some(cause) => outcome.with_teardown_failure(cause),
            None => outcome,
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(RunConfig::default())
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl TestTree {
    /// Run with the default sequential configuration
    #[must_use]
    pub fn run(&self) -> RunReport {
        Executor::default().run(self)
    }
}

/// Call a hook or body, turning a panic into an assertion failure
fn invoke(catch_panics: bool, call: impl FnOnce() -> Result<(), TestError>) -> Result<(), TestError> {
    if catch_panics {
        panic::catch_unwind(AssertUnwindSafe(call))
            .unwrap_or_else(|payload| Err(TestError::from_panic(payload.as_ref())))
    } else {
        call()
    }
}
