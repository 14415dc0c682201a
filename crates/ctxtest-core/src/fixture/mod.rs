//! Fixture Factory Chain
//!
//! Replays the constructors and derivers of every ancestor, root first, to
//! materialise the fixtures of exactly one test execution. Nothing is cached
//! between tests: every call to [`FixtureStack::resolve`] starts again from the
//! root, so a test can never observe state left behind by another.

mod chain;

pub(crate) use chain::FixtureStack;
