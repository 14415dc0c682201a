//! ctxtest core
//!
//! Hierarchical test contexts with per-test fixtures, built in two phases:
//! 1. **Construction Phase**: declare contexts, fixtures, hooks and tests into a `TestTree`
//! 2. **Execution Phase**: run the tree, one freshly replayed fixture chain per test
//!
//! # Quick Start
//!
//! ```rust
//! use ctxtest_core::prelude::*;
//!
//! // Construction phase
//! let tree = TestTree::build("list", |ctx| {
//!     ctx.derived_context::<Vec<i32>, _>("non-empty", |ctx| {
//!         ctx.fixture(|| vec![1, 2, 3]);
//!         ctx.test("push", |list| {
//!             list.push(4);
//!             assert_eq!(list.len(), 4);
//!         });
//!         ctx.test("push again", |list| {
//!             list.push(4);
//!             assert_eq!(list.len(), 4);
//!         });
//!     });
//! })?;
//!
//! // Execution phase
//! let report = Executor::new(RunConfig::default()).run(&tree);
//! assert!(report.passed());
//! # Ok::<(), BuildError>(())
//! ```

// Core modules
pub mod config;
pub mod error;
pub mod outcome;
pub mod report;
pub mod tree;

// Phases
pub mod construction;
pub mod executor;
mod fixture;

// Re-exports
pub use config::RunConfig;
pub use construction::ContextBuilder;
pub use error::{BuildError, ConfigError, DeclarationError, FixtureKind};
pub use executor::state::{RunEvent, RunState};
pub use executor::{CancelToken, Executor};
pub use outcome::{assume, ensure, AssertionFailure, Expectation, IntoTestResult, Outcome, Skip, TestError};
pub use report::{RunId, RunReport, RunSummary, TestRecord};
pub use tree::{Child, ContextNode, TestId, TestNode, TestPath, TestTree};

/// Everything needed to declare and run a tree
pub mod prelude {
    pub use crate::config::RunConfig;
    pub use crate::construction::ContextBuilder;
    pub use crate::error::{BuildError, DeclarationError};
    pub use crate::executor::{CancelToken, Executor};
    pub use crate::outcome::{assume, ensure, Outcome, TestError};
    pub use crate::report::RunReport;
    pub use crate::tree::TestTree;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
