//! Built-in suites shipped with the runner

pub mod fizzbuzz;
pub mod tour;

use ctxtest_core::{BuildError, TestTree};

/// A named tree the runner can build on demand
#[derive(Debug, Clone, Copy)]
pub struct Suite {
    pub name: &'static str,
    pub about: &'static str,
    pub build: fn() -> Result<TestTree, BuildError>,
}

/// Every registered suite, in listing order
pub const SUITES: &[Suite] = &[
    Suite {
        name: "fizzbuzz-examples",
        about: "Example-based FizzBuzz tests",
        build: fizzbuzz::examples,
    },
    Suite {
        name: "fizzbuzz-theories",
        about: "FizzBuzz theories over 1..=30 with assumptions",
        build: fizzbuzz::theories,
    },
    Suite {
        name: "fizzbuzz-table",
        about: "FizzBuzz table for 1..=31 against the approved text",
        build: fizzbuzz::table,
    },
    Suite {
        name: "fixtures-tour",
        about: "Fresh, derived and inherited fixtures with hooks",
        build: tour::tour,
    },
];

/// Look up a suite by name
pub fn find(name: &str) -> Option<&'static Suite> {
    SUITES.iter().find(|suite| suite.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for (i, suite) in SUITES.iter().enumerate() {
            assert!(
                SUITES[i + 1..].iter().all(|other| other.name != suite.name),
                "duplicate suite {}",
                suite.name
            );
        }
    }

    #[test]
    fn every_suite_builds_and_passes() {
        for suite in SUITES {
            let tree = (suite.build)().unwrap();
            assert_eq!(tree.root().name(), suite.name);
            let report = tree.run();
            assert!(report.passed(), "{}", report.to_text());
        }
    }

    #[test]
    fn unknown_suite_is_absent() {
        assert!(find("fizzbuzz-examples").is_some());
        assert!(find("nope").is_none());
    }
}
