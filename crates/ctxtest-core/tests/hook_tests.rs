use ctxtest_core::prelude::*;
use ctxtest_core::{ContextBuilder, RunEvent, RunState};
use ctxtest_test_utils::{nested_hook_tree, outcome_at, outcome_table, Probe};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

#[test]
fn test_nested_hooks_wrap_the_body() {
    let probe = Probe::new();
    let tree = nested_hook_tree(&probe);

    let report = tree.run();
    assert!(report.passed());
    assert_eq!(
        probe.events(),
        [
            "root.before",
            "mid.before",
            "leaf.before",
            "body",
            "leaf.after",
            "mid.after",
            "root.after",
        ]
    );
}

#[test]
fn test_every_run_replays_the_hooks() {
    let probe = Probe::new();
    let tree = nested_hook_tree(&probe);

    assert!(tree.run().passed());
    let first = probe.events();
    probe.clear();
    assert!(tree.run().passed());
    assert_eq!(probe.events(), first);
}

#[test]
fn test_failing_before_hook_unwinds_started_contexts_only() {
    let probe = Probe::new();
    let tree = TestTree::build("root", |root| {
        root.before(probe.marker("root.before"));
        root.after(probe.marker("root.after"));
        root.context("mid", |mid| {
            let p = probe.clone();
            mid.before(move |_| {
                p.record("mid.before");
                ensure(false, "mid refused")
            });
            mid.after(probe.marker("mid.after"));
            mid.context("leaf", |leaf| {
                leaf.before(probe.marker("leaf.before"));
                leaf.after(probe.marker("leaf.after"));
                leaf.test("body", probe.marker("body"));
            });
        });
    })
    .unwrap();

    let report = tree.run();
    assert_eq!(
        probe.events(),
        ["root.before", "mid.before", "mid.after", "root.after"]
    );
    assert_eq!(
        outcome_at(&report, "root / mid / leaf / body"),
        &Outcome::SetupFailed {
            cause: "before-hook in `mid` failed: mid refused".into()
        }
    );
}

#[test]
fn test_later_before_hook_failure_still_releases_earlier_setup() {
    let probe = Probe::new();
    let tree = TestTree::build("root", |root| {
        root.context("db", |db| {
            db.before(probe.marker("acquire connection"));
            db.before(|_| ensure(false, "migration failed"));
            db.after(probe.marker("release connection"));
            db.test("query", probe.marker("query"));
        });
    })
    .unwrap();

    let report = tree.run();
    assert_eq!(probe.events(), ["acquire connection", "release connection"]);
    assert_eq!(
        outcome_at(&report, "root / db / query"),
        &Outcome::SetupFailed {
            cause: "before-hook in `db` failed: migration failed".into()
        }
    );
}

#[test]
fn test_teardown_failure_is_never_dropped() {
    let tree = TestTree::build("root", |root| {
        root.after(|_| -> anyhow::Result<()> { anyhow::bail!("could not release lock") });
        root.test_expecting_failure("known bug", |_| ensure(false, "still broken"));
        root.test("skips", |_| assume(false, "not applicable"));
        root.test_expecting_failure("fixed bug", |_| {});
    })
    .unwrap();

    let report = tree.run();
    assert_eq!(
        outcome_table(&report),
        [
            ("root / known bug".to_string(), "errored"),
            ("root / skips".to_string(), "errored"),
            ("root / fixed bug".to_string(), "errored"),
        ]
    );
    for record in &report.records {
        assert!(record
            .outcome
            .detail()
            .is_some_and(|cause| cause.contains("could not release lock")));
    }
    assert!(!report.passed());
}

#[test]
fn test_teardown_failure_turns_pass_into_error() {
    let tree = TestTree::build("root", |root| {
        root.after(|_| -> anyhow::Result<()> { anyhow::bail!("could not release lock") });
        root.test("passes", |_| {});
        root.test("fails", |_| ensure(false, "body failed"));
    })
    .unwrap();

    let report = tree.run();
    assert_eq!(
        outcome_table(&report),
        [
            ("root / passes".to_string(), "errored"),
            ("root / fails".to_string(), "failed"),
        ]
    );
    assert!(outcome_at(&report, "root / passes")
        .detail()
        .is_some_and(|cause| cause.contains("could not release lock")));
}

#[test]
fn test_observer_sees_states_in_order() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let executor = Executor::new(RunConfig::default()).with_observer(move |event| {
        if let RunEvent::StateChanged { state, .. } = event {
            sink.lock().push(*state);
        }
    });

    let probe = Probe::new();
    let report = executor.run(&nested_hook_tree(&probe));
    assert!(report.passed());
    assert_eq!(
        *events.lock(),
        [
            RunState::ResolvingFixture,
            RunState::RunningBeforeHooks,
            RunState::RunningBody,
            RunState::RunningAfterHooks,
            RunState::Recorded,
        ]
    );
}

fn nest(ctx: &mut ContextBuilder<(), ()>, probe: &Probe, depth: usize, level: usize, hooks: usize) {
    for k in 0..hooks {
        ctx.before(probe.marker(&format!("before {level}.{k}")));
        ctx.after(probe.marker(&format!("after {level}.{k}")));
    }
    if level + 1 == depth {
        ctx.test("body", probe.marker("body"));
    } else {
        ctx.context(format!("level {}", level + 1), |ctx| {
            nest(ctx, probe, depth, level + 1, hooks);
        });
    }
}

proptest! {
    #[test]
    fn prop_hooks_run_outermost_first_then_innermost_first(depth in 1..6usize, hooks in 0..4usize) {
        let probe = Probe::new();
        let tree = TestTree::build("level 0", |ctx| nest(ctx, &probe, depth, 0, hooks)).unwrap();
        prop_assert!(tree.run().passed());

        let mut expected = Vec::new();
        for level in 0..depth {
            for k in 0..hooks {
                expected.push(format!("before {level}.{k}"));
            }
        }
        expected.push("body".to_string());
        for level in (0..depth).rev() {
            for k in 0..hooks {
                expected.push(format!("after {level}.{k}"));
            }
        }
        prop_assert_eq!(probe.events(), expected);
    }
}
