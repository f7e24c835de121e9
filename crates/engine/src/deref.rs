//! Replacing redirect and metacopy shortcuts with real copies.

use std::path::Path;

use walk::{DualWalkBuilder, Flow, NodeObservation, Visitor, drive};

use crate::error::{EngineError, EngineResult};
use crate::plan::{Action, Plan, Root, TaggedPath};

/// Where dereferenced entries are written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DerefTarget {
    /// Rewrite the upper layer in place.
    #[default]
    InPlace,
    /// Copy the upper layer to a new upper directory and rewrite the copy.
    NewUpper,
}

/// Plans the materialisation of every redirected directory and metacopy
/// file in `upper`, using the mounted overlay at `mount` as data source.
///
/// # Errors
///
/// Fails when a marked entry has no counterpart in the mount, and on any
/// traversal or marker failure.
pub fn deref(
    mount: &Path,
    upper: &Path,
    target: DerefTarget,
    inspector: &metadata::MarkerInspector,
) -> EngineResult<Plan> {
    logging::trace_plan!(
        info,
        mount = %mount.display(),
        upper = %upper.display(),
        ?target,
        "deref"
    );
    let mut visitor = DerefVisitor {
        plan: Plan::new(),
        inspector,
    };
    drive(DualWalkBuilder::new(upper, mount).build()?, &mut visitor)?;

    Ok(match target {
        DerefTarget::InPlace => visitor.plan,
        DerefTarget::NewUpper => {
            let copy = Action::Copy {
                from: TaggedPath::new(Root::Upper, ""),
                to: TaggedPath::new(Root::UpperNew, ""),
            };
            std::iter::once(copy)
                .chain(
                    visitor
                        .plan
                        .into_iter()
                        .map(|action| action.retarget(Root::Upper, Root::UpperNew)),
                )
                .collect()
        }
    })
}

struct DerefVisitor<'a> {
    plan: Plan,
    inspector: &'a metadata::MarkerInspector,
}

impl DerefVisitor<'_> {
    fn require_mount_entry(node: &NodeObservation) -> EngineResult<()> {
        if node.secondary().is_none() {
            return Err(EngineError::MissingMountEntry {
                path: node.secondary_path().to_path_buf(),
            });
        }
        Ok(())
    }

    fn copy_from_mount(&mut self, node: &NodeObservation) {
        self.plan.push(Action::Copy {
            from: TaggedPath::new(Root::Mount, node.relative_path()),
            to: TaggedPath::new(Root::Upper, node.relative_path()),
        });
    }
}

impl Visitor for DerefVisitor<'_> {
    type Error = EngineError;

    fn on_enter_dir(&mut self, node: &NodeObservation) -> EngineResult<Flow> {
        if !self.inspector.is_redirect(node.primary_path())? {
            return Ok(Flow::Continue);
        }
        Self::require_mount_entry(node)?;
        self.plan
            .push(Action::RemoveTree(TaggedPath::new(Root::Upper, node.relative_path())));
        self.copy_from_mount(node);
        Ok(Flow::SkipSubtree)
    }

    fn on_file(&mut self, node: &NodeObservation) -> EngineResult<()> {
        if !self.inspector.is_metacopy(node.primary_path())? {
            return Ok(());
        }
        Self::require_mount_entry(node)?;
        self.plan
            .push(Action::Remove(TaggedPath::new(Root::Upper, node.relative_path())));
        self.copy_from_mount(node);
        Ok(())
    }
}
