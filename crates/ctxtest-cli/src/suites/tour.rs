//! Walk through fresh, derived and inherited fixtures

use ctxtest_core::prelude::*;

pub fn tour() -> Result<TestTree, BuildError> {
    TestTree::build("fixtures-tour", |ctx| {
        ctx.derived_context::<Vec<i32>, _>("a non-empty list", |ctx| {
            ctx.fixture(|| vec![1, 2, 3]);
            ctx.before(|list| ensure(list.len() == 3, "every test starts from three items"));

            // Both append tests see the pristine fixture.
            ctx.test("can be appended to", |list| {
                list.push(4);
                assert_eq!(list.len(), 4);
            });
            ctx.test("can be appended to again", |list| {
                list.push(4);
                assert_eq!(list.len(), 4);
            });
            ctx.test_expecting_failure("is not empty", |list| {
                ensure(list.is_empty(), "list has items")
            });

            ctx.context("after popping", |ctx| {
                ctx.before(|list| {
                    list.pop();
                });
                ctx.test("has two items", |list| ensure(list.len() == 2, format!("{list:?}")));
            });

            ctx.derived_context::<usize, _>("its length", |ctx| {
                ctx.derive_fixture(|list: &Vec<i32>| list.len());
                ctx.test("is three", |len| ensure(*len == 3, format!("length was {len}")));
            });
        });

        ctx.derived_context::<String, _>("a greeting", |ctx| {
            ctx.try_fixture(|| Ok(String::from("hello")));
            ctx.after(|greeting| ensure(!greeting.is_empty(), "greeting was cleared"));
            ctx.test("can be extended", |greeting| {
                greeting.push_str(", world");
                ensure(*greeting == "hello, world", format!("got {greeting:?}"))
            });
            ctx.test("skips when it has nothing to check", |greeting| {
                assume(greeting.contains("world"), "no world yet")
            });
        });

        ctx.test("needs no fixture", |_: &mut ()| {});
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tour_outcomes() {
        let report = tour().unwrap().run();
        let table: Vec<_> = report
            .records
            .iter()
            .map(|record| (record.path.to_string(), record.outcome.label()))
            .collect();
        assert_eq!(
            table,
            [
                ("fixtures-tour / a non-empty list / can be appended to".to_string(), "passed"),
                ("fixtures-tour / a non-empty list / can be appended to again".to_string(), "passed"),
                ("fixtures-tour / a non-empty list / is not empty".to_string(), "expected failure"),
                ("fixtures-tour / a non-empty list / after popping / has two items".to_string(), "passed"),
                ("fixtures-tour / a non-empty list / its length / is three".to_string(), "passed"),
                ("fixtures-tour / a greeting / can be extended".to_string(), "passed"),
                ("fixtures-tour / a greeting / skips when it has nothing to check".to_string(), "skipped"),
                ("fixtures-tour / needs no fixture".to_string(), "passed"),
            ]
        );
        assert!(report.passed());
    }

    #[test]
    fn tour_runs_in_parallel_with_the_same_outcomes() {
        let tree = tour().unwrap();
        let sequential = tree.run();
        let parallel = Executor::new(RunConfig::default().with_parallel(true)).run(&tree);
        let outcomes = |report: &RunReport| {
            report
                .records
                .iter()
                .map(|record| record.outcome.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(outcomes(&sequential), outcomes(&parallel));
    }
}
