use crate::outcome::panic_message;
use crate::tree::{ContextNode, Fixture, FixtureSource};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Resolved fixtures for one test, one slot per declaring ancestor
///
/// Contexts that inherit share their parent's slot. Slot 0 is the implicit
/// unit fixture above the root.
pub(crate) struct FixtureStack {
    slots: Vec<Fixture>,
    /// Slot index for each level of the chain
    levels: Vec<usize>,
}

impl FixtureStack {
    /// Replay the chain root to leaf
    ///
    /// Returns the rendered cause when a constructor or deriver fails or panics.
    pub(crate) fn resolve(chain: &[&ContextNode], catch_panics: bool) -> Result<Self, String> {
        let mut slots: Vec<Fixture> = vec![Box::new(())];
        let mut levels = Vec::with_capacity(chain.len());
        let mut current = 0;

        for context in chain {
            let produced = match &context.fixture {
                FixtureSource::Inherit => None,
                FixtureSource::Construct(construct) => {
                    Some(guard(catch_panics, || construct()))
                }
                FixtureSource::Derive(derive) => {
                    let parent: &dyn Any = &*slots[current];
                    Some(guard(catch_panics, || derive(parent)))
                }
            };

            if let Some(produced) = produced {
                let fixture = produced.map_err(|cause| {
                    format!("fixture for context `{}` failed: {cause}", context.name)
                })?;
                slots.push(fixture);
                current = slots.len() - 1;
            }
            levels.push(current);
        }

        Ok(Self { slots, levels })
    }

    /// Fixture seen by the context at `level` of the chain
    pub(crate) fn level_mut(&mut self, level: usize) -> &mut dyn Any {
        &mut *self.slots[self.levels[level]]
    }

    /// Fixture seen by the test itself
    pub(crate) fn leaf_mut(&mut self) -> &mut dyn Any {
        let slot = self.levels.last().copied().unwrap_or(0);
        &mut *self.slots[slot]
    }

    /// Number of distinct fixture values materialised, including the unit root
    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

fn guard(
    catch_panics: bool,
    produce: impl FnOnce() -> anyhow::Result<Fixture>,
) -> Result<Fixture, String> {
    let result = if catch_panics {
        panic::catch_unwind(AssertUnwindSafe(produce))
            .map_err(|payload| format!("panicked: {}", panic_message(payload.as_ref())))?
    } else {
        produce()
    };
    result.map_err(|error| format!("{error:#}"))
}
