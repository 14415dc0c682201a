//! Context Builder
//!
//! The primary interface for the construction phase.
//!
//! Usage:
//! ```rust
//! use ctxtest_core::TestTree;
//!
//! let tree = TestTree::build("stack", |ctx| {
//!     ctx.derived_context::<Vec<i32>, _>("non-empty", |ctx| {
//!         ctx.fixture(|| vec![1, 2, 3]);
//!         ctx.test("can push", |list| {
//!             list.push(4);
//!             assert_eq!(list.len(), 4);
//!         });
//!     });
//! })
//! .unwrap();
//! assert_eq!(tree.test_count(), 1);
//! ```

use crate::error::{BuildError, DeclarationError, FixtureKind};
use crate::outcome::{Expectation, IntoTestResult, TestError};
use crate::tree::{Child, ContextNode, Fixture, FixtureSource, HookFn, TestNode, TestTree};
use std::any::{type_name, Any, TypeId};
use std::marker::PhantomData;

/// Builder for one context
///
/// `P` is the fixture type of the parent context, `F` the fixture type of this
/// one. Hooks and tests declared here receive `&mut F`.
pub struct ContextBuilder<P, F> {
    node: ContextNode,
    path: Vec<String>,
    errors: Vec<BuildError>,
    _fixtures: PhantomData<fn(&P) -> F>,
}

impl<P: 'static, F: 'static> ContextBuilder<P, F> {
    fn open(name: String, parent_path: &[String]) -> Self {
        let mut path = parent_path.to_vec();
        path.push(name.clone());
        let mut builder = Self {
            node: ContextNode::new(name),
            path,
            errors: Vec::new(),
            _fixtures: PhantomData,
        };
        if builder.node.name.is_empty() {
            builder.reject(DeclarationError::EmptyName { node: "context" });
        }
        builder
    }

    /// Close the context, checking that its fixture type can be produced
    fn finish(mut self) -> (ContextNode, Vec<BuildError>) {
        let changes_type = TypeId::of::<P>() != TypeId::of::<F>();
        if changes_type && matches!(self.node.fixture, FixtureSource::Inherit) {
            self.reject(DeclarationError::MissingFixture {
                parent: type_name::<P>(),
                fixture: type_name::<F>(),
            });
        }
        (self.node, self.errors)
    }

    fn reject(&mut self, error: DeclarationError) {
        self.errors.push(BuildError::new(self.path.clone(), error));
    }

    fn declare_fixture(&mut self, kind: FixtureKind, source: FixtureSource) {
        let existing = match &self.node.fixture {
            FixtureSource::Inherit => None,
            FixtureSource::Construct(_) => Some(FixtureKind::Constructor),
            FixtureSource::Derive(_) => Some(FixtureKind::Deriver),
        };
        match existing {
            None => self.node.fixture = source,
            Some(previous) if previous == kind => {
                self.reject(DeclarationError::DuplicateFixture { kind });
            }
            Some(_) => self.reject(DeclarationError::ConflictingFixture),
        }
    }

    /// Context names from the root to this context
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Register a constructor producing a fresh fixture for every test
    ///
    /// Any inherited fixture is ignored below this context. At most one of
    /// `fixture` and `derive_fixture` may be declared per context.
    pub fn fixture<C>(&mut self, constructor: C) -> &mut Self
    where
        C: Fn() -> F + Send + Sync + 'static,
    {
        self.try_fixture(move || Ok(constructor()))
    }

    /// Fallible [`fixture`](Self::fixture); an `Err` fails the test's setup
    pub fn try_fixture<C>(&mut self, constructor: C) -> &mut Self
    where
        C: Fn() -> anyhow::Result<F> + Send + Sync + 'static,
    {
        let construct = Box::new(move || constructor().map(|fixture| Box::new(fixture) as Fixture));
        self.declare_fixture(FixtureKind::Constructor, FixtureSource::Construct(construct));
        self
    }

    /// Register a deriver computing this context's fixture from the parent's
    pub fn derive_fixture<D>(&mut self, deriver: D) -> &mut Self
    where
        D: Fn(&P) -> F + Send + Sync + 'static,
    {
        self.try_derive_fixture(move |parent| Ok(deriver(parent)))
    }

    /// Fallible [`derive_fixture`](Self::derive_fixture)
    pub fn try_derive_fixture<D>(&mut self, deriver: D) -> &mut Self
    where
        D: Fn(&P) -> anyhow::Result<F> + Send + Sync + 'static,
    {
        let derive = Box::new(move |parent: &dyn Any| {
            let parent = parent.downcast_ref::<P>().ok_or_else(|| {
                anyhow::anyhow!("parent fixture is not a `{}`", type_name::<P>())
            })?;
            deriver(parent).map(|fixture| Box::new(fixture) as Fixture)
        });
        self.declare_fixture(FixtureKind::Deriver, FixtureSource::Derive(derive));
        self
    }

    /// Append a hook run before every test below this context
    pub fn before<H, R>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(&mut F) -> R + Send + Sync + 'static,
        R: IntoTestResult,
    {
        self.node.before.push(erase::<F, H, R>(hook));
        self
    }

    /// Append a hook run after every test below this context, even when it failed
    pub fn after<H, R>(&mut self, hook: H) -> &mut Self
    where
        H: Fn(&mut F) -> R + Send + Sync + 'static,
        R: IntoTestResult,
    {
        self.node.after.push(erase::<F, H, R>(hook));
        self
    }

    /// Declare a test
    pub fn test<B, R>(&mut self, name: impl Into<String>, body: B) -> &mut Self
    where
        B: Fn(&mut F) -> R + Send + Sync + 'static,
        R: IntoTestResult,
    {
        self.push_test(name.into(), Expectation::Pass, erase::<F, B, R>(body));
        self
    }

    /// Declare a test whose body is expected to fail
    pub fn test_expecting_failure<B, R>(&mut self, name: impl Into<String>, body: B) -> &mut Self
    where
        B: Fn(&mut F) -> R + Send + Sync + 'static,
        R: IntoTestResult,
    {
        self.push_test(name.into(), Expectation::Failure, erase::<F, B, R>(body));
        self
    }

    fn push_test(&mut self, name: String, expectation: Expectation, body: HookFn) {
        if name.is_empty() {
            self.reject(DeclarationError::EmptyName { node: "test" });
        }
        self.node.children.push(Child::Test(TestNode {
            name,
            body,
            expectation,
        }));
    }

    /// Declare a sub-context sharing this context's fixture type
    ///
    /// Without its own `fixture`/`derive_fixture` the sub-context passes this
    /// context's fixture through unchanged.
    pub fn context<B>(&mut self, name: impl Into<String>, body: B) -> &mut Self
    where
        B: FnOnce(&mut ContextBuilder<F, F>),
    {
        self.derived_context::<F, B>(name, body)
    }

    /// Declare a sub-context with fixture type `G`
    ///
    /// When `G` differs from `F` the sub-context must declare a constructor or
    /// deriver, otherwise the build fails.
    pub fn derived_context<G, B>(&mut self, name: impl Into<String>, body: B) -> &mut Self
    where
        G: 'static,
        B: FnOnce(&mut ContextBuilder<F, G>),
    {
        let mut child = ContextBuilder::<F, G>::open(name.into(), &self.path);
        body(&mut child);
        let (node, errors) = child.finish();
        self.errors.extend(errors);
        self.node.children.push(Child::Context(node));
        self
    }
}

fn erase<F, H, R>(hook: H) -> HookFn
where
    F: 'static,
    H: Fn(&mut F) -> R + Send + Sync + 'static,
    R: IntoTestResult,
{
    Box::new(move |fixture: &mut dyn Any| {
        let fixture = fixture.downcast_mut::<F>().ok_or_else(|| {
            TestError::unexpected(anyhow::anyhow!(
                "fixture is not a `{}`",
                type_name::<F>()
            ))
        })?;
        hook(fixture).into_test_result()
    })
}

impl TestTree {
    /// Build a tree whose root has the unit fixture
    ///
    /// # Errors
    /// Returns the first declaration error found anywhere in the tree.
    pub fn build<B>(name: impl Into<String>, body: B) -> Result<Self, BuildError>
    where
        B: FnOnce(&mut ContextBuilder<(), ()>),
    {
        Self::build_with::<(), B>(name, body)
    }

    /// Build a tree whose root context has fixture type `F`
    ///
    /// Unless `F` is `()`, the root must declare `fixture` (or derive from `()`).
    ///
    /// # Errors
    /// Returns the first declaration error found anywhere in the tree.
    pub fn build_with<F, B>(name: impl Into<String>, body: B) -> Result<Self, BuildError>
    where
        F: 'static,
        B: FnOnce(&mut ContextBuilder<(), F>),
    {
        let mut root = ContextBuilder::<(), F>::open(name.into(), &[]);
        body(&mut root);
        let (root, errors) = root.finish();
        match errors.into_iter().next() {
            Some(error) => {
                tracing::warn!(path = %error.path.join(" / "), "test tree rejected: {}", error.source);
                Err(error)
            }
            None => {
                let tree = Self { root };
                tracing::debug!(tests = tree.test_count(), "test tree built");
                Ok(tree)
            }
        }
    }
}
