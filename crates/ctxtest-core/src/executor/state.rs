//! Run state machine
//!
//! `NotStarted -> Traversing -> (ResolvingFixture -> RunningBeforeHooks ->
//! RunningBody -> RunningAfterHooks -> Recorded)* -> Completed`
//!
//! Setup failures short-circuit: `ResolvingFixture -> Recorded` when the chain
//! cannot be resolved, `RunningBeforeHooks -> RunningAfterHooks` when a
//! before-hook fails. There is no retry state.
//!
//! Only per-test states are emitted as [`RunEvent::StateChanged`]. The run
//! level `NotStarted` and `Completed` states are observable as
//! [`RunEvent::RunStarted`] and [`RunEvent::RunCompleted`].

use crate::report::TestRecord;
use crate::tree::{TestId, TestPath};
use serde::{Deserialize, Serialize};

/// Executor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Executor created, nothing run
    NotStarted,
    /// Between tests
    Traversing,
    /// Replaying constructors and derivers
    ResolvingFixture,
    /// Running before-hooks root to leaf
    RunningBeforeHooks,
    /// Running the test body
    RunningBody,
    /// Running after-hooks leaf to root
    RunningAfterHooks,
    /// Outcome recorded
    Recorded,
    /// Every test recorded, or the run was cancelled
    Completed,
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: RunState) -> Vec<RunState> {
    use RunState::*;
    match from {
        NotStarted => vec![Traversing],
        Traversing => vec![ResolvingFixture, Recorded, Completed],
        ResolvingFixture => vec![RunningBeforeHooks, Recorded],
        RunningBeforeHooks => vec![RunningBody, RunningAfterHooks],
        RunningBody => vec![RunningAfterHooks],
        RunningAfterHooks => vec![Recorded],
        Recorded => vec![Traversing],
        Completed => vec![],
    }
}

/// Check a state transition
///
/// # Errors
/// Returns [`IllegalTransition`] if `to` is not reachable from `from`.
pub fn validate_transition(from: RunState, to: RunState) -> Result<(), IllegalTransition> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(IllegalTransition { from, to })
    }
}

/// A transition the state machine does not allow
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal run state transition {from:?} -> {to:?}")]
pub struct IllegalTransition {
    /// State before
    pub from: RunState,
    /// Rejected target
    pub to: RunState,
}

/// Progress notification delivered to a run observer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// Traversal begins
    RunStarted {
        /// Tests in the tree
        total: usize,
    },
    /// A test is about to execute
    TestStarted {
        /// Positional id
        id: TestId,
        /// Name path
        path: TestPath,
    },
    /// A test's state changed
    StateChanged {
        /// Test whose state changed
        id: TestId,
        /// New state
        state: RunState,
    },
    /// A test's outcome was recorded
    TestRecorded(TestRecord),
    /// Traversal finished
    RunCompleted {
        /// Tests recorded
        recorded: usize,
        /// Whether the run stopped early
        cancelled: bool,
    },
}

/// Per-test state tracker enforcing the transition table
pub(crate) struct StateTracker<'o> {
    id: TestId,
    state: RunState,
    notify: &'o (dyn Fn(&RunEvent) + Sync),
}

impl<'o> StateTracker<'o> {
    pub(crate) fn new(id: TestId, notify: &'o (dyn Fn(&RunEvent) + Sync)) -> Self {
        Self {
            id,
            state: RunState::Traversing,
            notify,
        }
    }

    pub(crate) fn advance(&mut self, to: RunState) {
        if let Err(illegal) = validate_transition(self.state, to) {
            #[cfg(feature = "strict-debug")]
            panic!("{illegal}");

            #[cfg(not(feature = "strict-debug"))]
            tracing::error!(test = %self.id, "{illegal}");
        }
        self.state = to;
        (self.notify)(&RunEvent::StateChanged {
            id: self.id.clone(),
            state: to,
        });
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> RunState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_allowed() {
        use RunState::*;
        let path = [
            NotStarted,
            Traversing,
            ResolvingFixture,
            RunningBeforeHooks,
            RunningBody,
            RunningAfterHooks,
            Recorded,
            Traversing,
            Completed,
        ];
        for pair in path.windows(2) {
            assert!(validate_transition(pair[0], pair[1]).is_ok(), "{pair:?}");
        }
    }

    #[test]
    fn no_retry_and_no_escape_from_completed() {
        assert!(validate_transition(RunState::Recorded, RunState::RunningBody).is_err());
        assert!(validate_transition(RunState::RunningBody, RunState::ResolvingFixture).is_err());
        assert!(allowed_transitions(RunState::Completed).is_empty());
    }

    #[test]
    fn body_cannot_be_skipped_to_record() {
        let err = validate_transition(RunState::RunningBody, RunState::Recorded).unwrap_err();
        assert_eq!(err.from, RunState::RunningBody);
        assert!(err.to_string().contains("RunningBody -> Recorded"));
    }

    #[test]
    fn tracker_reports_each_change() {
        let seen = std::sync::Mutex::new(Vec::new());
        let notify = |event: &RunEvent| {
            if let RunEvent::StateChanged { state, .. } = event {
                seen.lock().unwrap().push(*state);
            }
        };
        let mut tracker = StateTracker::new(TestId(vec![0]), &notify);
        tracker.advance(RunState::ResolvingFixture);
        tracker.advance(RunState::Recorded);
        assert_eq!(tracker.state(), RunState::Recorded);
        assert_eq!(
            *seen.lock().unwrap(),
            [RunState::ResolvingFixture, RunState::Recorded]
        );
    }
}
