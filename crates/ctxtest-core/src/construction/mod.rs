//! Construction Phase
//!
//! Everything needed to declare a test tree. Declaration is ordinary control
//! flow: loops and conditionals in the builder closures generate contexts and
//! tests, and the executor only ever sees the expanded tree.
//!
//! # Two-Phase Architecture
//!
//! 1. **Construction Phase** (this module):
//!    - Declare contexts, tests, fixtures and hooks
//!    - Reject conflicting fixture declarations
//!    - Produce an immutable `TestTree`
//!
//! 2. **Execution Phase** (executor module):
//!    - Replay fixture chains per test
//!    - Run hooks and bodies
//!    - Record outcomes
//!
//! No fixture is ever constructed during this phase.

pub mod builder;

pub use builder::ContextBuilder;
