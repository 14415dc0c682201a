//! FizzBuzz, three ways: examples, theories and an approved table

use ctxtest_core::prelude::*;
use ctxtest_core::AssertionFailure;
use std::ops::RangeInclusive;

const APPROVED_TABLE: &str = include_str!("../../approved/fizzbuzz_table.txt");

/// Numbers the theories are checked against
const DATA_POINTS: RangeInclusive<u32> = 1..=30;

/// Rows of the approved table
const TABLE_ROWS: RangeInclusive<u32> = 1..=31;

pub fn fizz_buzz(n: u32) -> String {
    match (n % 3, n % 5) {
        (0, 0) => "FizzBuzz".to_string(),
        (0, _) => "Fizz".to_string(),
        (_, 0) => "Buzz".to_string(),
        _ => n.to_string(),
    }
}

pub fn examples() -> Result<TestTree, BuildError> {
    TestTree::build("fizzbuzz-examples", |ctx| {
        ctx.test("other numbers", |_| {
            assert_eq!(fizz_buzz(1), "1");
            assert_eq!(fizz_buzz(2), "2");
        });
        ctx.test("fizz for multiples of three", |_| {
            assert_eq!(fizz_buzz(3), "Fizz");
            assert_eq!(fizz_buzz(6), "Fizz");
        });
        ctx.test("buzz for multiples of five", |_| {
            assert_eq!(fizz_buzz(5), "Buzz");
            assert_eq!(fizz_buzz(10), "Buzz");
        });
        ctx.test("fizzbuzz for multiples of three and five", |_| {
            assert_eq!(fizz_buzz(15), "FizzBuzz");
            assert_eq!(fizz_buzz(30), "FizzBuzz");
        });
        ctx.test("zero is a multiple of everything", |_| {
            ensure(fizz_buzz(0) == "FizzBuzz", "0 should be FizzBuzz")
        });
    })
}

struct Theory {
    name: &'static str,
    check: fn(u32) -> Result<(), TestError>,
}

const THEORIES: &[Theory] = &[
    Theory {
        name: "is never empty",
        check: is_never_empty,
    },
    Theory {
        name: "starts with Fizz when divisible by 3",
        check: starts_with_fizz,
    },
    Theory {
        name: "ends with Buzz when divisible by 5",
        check: ends_with_buzz,
    },
    Theory {
        name: "is FizzBuzz when divisible by 15",
        check: is_fizzbuzz,
    },
    Theory {
        name: "is the number otherwise",
        check: is_the_number,
    },
];

fn is_never_empty(n: u32) -> Result<(), TestError> {
    ensure(!fizz_buzz(n).is_empty(), format!("empty output for {n}"))?;
    Ok(())
}

fn starts_with_fizz(n: u32) -> Result<(), TestError> {
    assume(n % 3 == 0, format!("{n} is not divisible by 3"))?;
    let out = fizz_buzz(n);
    ensure(out.starts_with("Fizz"), format!("{n} gave {out:?}"))?;
    Ok(())
}

fn ends_with_buzz(n: u32) -> Result<(), TestError> {
    assume(n % 5 == 0, format!("{n} is not divisible by 5"))?;
    let out = fizz_buzz(n);
    ensure(out.ends_with("Buzz"), format!("{n} gave {out:?}"))?;
    Ok(())
}

fn is_fizzbuzz(n: u32) -> Result<(), TestError> {
    assume(n % 15 == 0, format!("{n} is not divisible by 15"))?;
    let out = fizz_buzz(n);
    ensure(out == "FizzBuzz", format!("{n} gave {out:?}"))?;
    Ok(())
}

fn is_the_number(n: u32) -> Result<(), TestError> {
    assume(n % 3 != 0 && n % 5 != 0, format!("{n} is divisible by 3 or 5"))?;
    let out = fizz_buzz(n);
    ensure(out == n.to_string(), format!("{n} gave {out:?}"))?;
    Ok(())
}

/// One context per theory, one test per data point
pub fn theories() -> Result<TestTree, BuildError> {
    TestTree::build("fizzbuzz-theories", |ctx| {
        for theory in THEORIES {
            let check = theory.check;
            ctx.context(theory.name, |ctx| {
                for n in DATA_POINTS {
                    ctx.test(n.to_string(), move |_| check(n));
                }
            });
        }
    })
}

pub fn render_table(rows: RangeInclusive<u32>) -> String {
    rows.map(|n| format!("{n}\t = \t{}", fizz_buzz(n)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compare `actual` with `approved`, ignoring trailing whitespace
///
/// # Errors
/// Names the first line that differs.
pub fn approve(actual: &str, approved: &str) -> Result<(), AssertionFailure> {
    let mut actual_lines = actual.trim_end().lines();
    let mut approved_lines = approved.trim_end().lines();
    for line in 1.. {
        match (actual_lines.next(), approved_lines.next()) {
            (None, None) => return Ok(()),
            (a, b) if a == b => continue,
            (a, b) => {
                return Err(AssertionFailure::new(format!(
                    "line {line}: expected {:?}, got {:?}",
                    b.unwrap_or("<end>"),
                    a.unwrap_or("<end>"),
                )))
            }
        }
    }
    Ok(())
}

pub fn table() -> Result<TestTree, BuildError> {
    TestTree::build_with::<String, _>("fizzbuzz-table", |ctx| {
        ctx.fixture(|| render_table(TABLE_ROWS));
        ctx.test("matches approved table", |table| approve(table, APPROVED_TABLE));
    })
}
