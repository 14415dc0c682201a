//! The built test tree
//!
//! Produced by [`TestTree::build`](crate::construction) and read-only from then
//! on. Fixtures are type-erased here; the typed API lives in
//! [`ContextBuilder`](crate::construction::ContextBuilder).

use crate::outcome::{Expectation, TestError};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// A fixture value of any type, owned by one test execution
pub(crate) type Fixture = Box<dyn Any>;

pub(crate) type ConstructFn = Box<dyn Fn() -> anyhow::Result<Fixture> + Send + Sync>;
pub(crate) type DeriveFn = Box<dyn Fn(&dyn Any) -> anyhow::Result<Fixture> + Send + Sync>;
pub(crate) type HookFn = Box<dyn Fn(&mut dyn Any) -> Result<(), TestError> + Send + Sync>;

/// Where a context's fixture comes from
pub(crate) enum FixtureSource {
    /// Parent's fixture, unchanged
    Inherit,
    /// Fresh value, ignoring the parent's
    Construct(ConstructFn),
    /// Function of the parent's fixture
    Derive(DeriveFn),
}

impl fmt::Debug for FixtureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inherit => f.write_str("Inherit"),
            Self::Construct(_) => f.write_str("Construct"),
            Self::Derive(_) => f.write_str("Derive"),
        }
    }
}

/// Named scope owning sub-contexts and tests
pub struct ContextNode {
    pub(crate) name: String,
    pub(crate) fixture: FixtureSource,
    pub(crate) before: Vec<HookFn>,
    pub(crate) after: Vec<HookFn>,
    pub(crate) children: Vec<Child>,
}

impl ContextNode {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            fixture: FixtureSource::Inherit,
            before: Vec::new(),
            after: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Context name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Children in declaration order
    #[must_use]
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// Number of before-hooks
    #[must_use]
    pub fn before_hook_count(&self) -> usize {
        self.before.len()
    }

    /// Number of after-hooks
    #[must_use]
    pub fn after_hook_count(&self) -> usize {
        self.after.len()
    }

    /// Whether this context declares its own fixture
    #[must_use]
    pub fn declares_fixture(&self) -> bool {
        !matches!(self.fixture, FixtureSource::Inherit)
    }
}

impl fmt::Debug for ContextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextNode")
            .field("name", &self.name)
            .field("fixture", &self.fixture)
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .field("children", &self.children)
            .finish()
    }
}

/// Leaf unit of work
pub struct TestNode {
    pub(crate) name: String,
    pub(crate) body: HookFn,
    pub(crate) expectation: Expectation,
}

impl TestNode {
    /// Test name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected-failure marker
    #[must_use]
    pub fn expectation(&self) -> Expectation {
        self.expectation
    }
}

impl fmt::Debug for TestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestNode")
            .field("name", &self.name)
            .field("expectation", &self.expectation)
            .finish_non_exhaustive()
    }
}

/// A context's child
#[derive(Debug)]
pub enum Child {
    /// Nested context
    Context(ContextNode),
    /// Test
    Test(TestNode),
}

/// Positional identity of a test: child indices from the root
///
/// Unique within a tree even when names repeat.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(pub Vec<usize>);

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for index in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
            first = false;
        }
        Ok(())
    }
}

/// Names from the root context down to a test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestPath {
    /// Enclosing context names, root first
    pub contexts: Vec<String>,
    /// Test name
    pub test: String,
}

impl TestPath {
    /// Depth of the enclosing context (root is 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.contexts.len()
    }
}

impl fmt::Display for TestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for context in &self.contexts {
            write!(f, "{context} / ")?;
        }
        f.write_str(&self.test)
    }
}

/// A test together with its ancestor chain, ready to execute
pub(crate) struct PlannedTest<'t> {
    pub(crate) id: TestId,
    pub(crate) path: TestPath,
    /// Root first, enclosing context last
    pub(crate) chain: Vec<&'t ContextNode>,
    pub(crate) test: &'t TestNode,
}

/// A fully built, immutable test tree
#[derive(Debug)]
pub struct TestTree {
    pub(crate) root: ContextNode,
}

impl TestTree {
    /// Root context
    #[must_use]
    pub fn root(&self) -> &ContextNode {
        &self.root
    }

    /// Number of tests in the tree
    #[must_use]
    pub fn test_count(&self) -> usize {
        fn count(node: &ContextNode) -> usize {
            node.children
                .iter()
                .map(|child| match child {
                    Child::Context(context) => count(context),
                    Child::Test(_) => 1,
                })
                .sum()
        }
        count(&self.root)
    }

    /// Paths of every test, depth-first in declaration order
    #[must_use]
    pub fn test_paths(&self) -> Vec<TestPath> {
        self.plan().into_iter().map(|planned| planned.path).collect()
    }

    /// Flatten into execution order
    pub(crate) fn plan(&self) -> Vec<PlannedTest<'_>> {
        fn walk<'t>(
            node: &'t ContextNode,
            chain: &mut Vec<&'t ContextNode>,
            position: &mut Vec<usize>,
            out: &mut Vec<PlannedTest<'t>>,
        ) {
            chain.push(node);
            for (index, child) in node.children.iter().enumerate() {
                position.push(index);
                match child {
                    Child::Context(context) => walk(context, chain, position, out),
                    Child::Test(test) => out.push(PlannedTest {
                        id: TestId(position.clone()),
                        path: TestPath {
                            contexts: chain.iter().map(|c| c.name.clone()).collect(),
                            test: test.name.clone(),
                        },
                        chain: chain.clone(),
                        test,
                    }),
                }
                position.pop();
            }
            chain.pop();
        }

        let mut out = Vec::new();
        walk(&self.root, &mut Vec::new(), &mut Vec::new(), &mut out);
        out
    }
}
