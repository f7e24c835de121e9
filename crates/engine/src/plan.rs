//! Typed action plans and the sinks that consume them.
//!
//! Operations append [`Action`]s to a [`Plan`] in visitation order. The plan
//! is handed to an [`ActionSink`] only after the operation succeeded, so a
//! failed walk never produces a partial script or a half-applied change.

mod action;
mod roots;

pub use action::{Action, Root, TaggedPath};
pub use roots::LayerRoots;

use crate::error::EngineResult;

/// Receives the actions of a completed plan, in order.
pub trait ActionSink {
    /// Handles one action.
    fn apply(&mut self, action: &Action) -> EngineResult<()>;

    /// Called once after the last action.
    fn finish(&mut self) -> EngineResult<()> {
        Ok(())
    }
}

/// Ordered list of planned actions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    actions: Vec<Action>,
}

impl Plan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `action`.
    pub fn push(&mut self, action: Action) {
        logging::trace_plan!(debug, "planned {action}");
        self.actions.push(action);
    }

    /// Planned actions in emission order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Number of planned actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` when nothing was planned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterates over the planned actions.
    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Feeds every action to `sink`, then finishes it.
    ///
    /// # Errors
    ///
    /// Stops at the first action the sink rejects.
    pub fn deliver(&self, sink: &mut dyn ActionSink) -> EngineResult<()> {
        for action in &self.actions {
            sink.apply(action)?;
        }
        sink.finish()?;
        logging::trace_plan!(info, actions = self.actions.len(), "plan delivered");
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

impl IntoIterator for Plan {
    type Item = Action;
    type IntoIter = std::vec::IntoIter<Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.into_iter()
    }
}

impl FromIterator<Action> for Plan {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}
