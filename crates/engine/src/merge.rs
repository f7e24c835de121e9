//! Folding an upper layer into its lower layer.

use std::path::Path;

use metadata::{MarkerInspector, permissions_identical};
use walk::{DualWalkBuilder, Flow, NodeObservation, Visitor, drive};

use crate::error::{EngineError, EngineResult};
use crate::plan::{Action, Plan, Root, TaggedPath};

/// Plans moving every upper change into `lower`.
///
/// Upper entries replace their lower peers, whiteouts delete them, and
/// upper directories that overlay a lower directory are descended into so
/// only their contents move. Once applied, the lower layer alone presents
/// the merged view and the upper layer is left empty.
///
/// # Errors
///
/// Redirected entries, metacopy files and an opaque upper root cannot be
/// merged and abort planning, as does any traversal or marker failure.
pub fn merge(lower: &Path, upper: &Path, inspector: &MarkerInspector) -> EngineResult<Plan> {
    logging::trace_plan!(info, lower = %lower.display(), upper = %upper.display(), "merge");
    let mut visitor = MergeVisitor {
        plan: Plan::new(),
        inspector,
    };
    drive(DualWalkBuilder::new(upper, lower).build()?, &mut visitor)?;
    Ok(visitor.plan)
}

struct MergeVisitor<'a> {
    plan: Plan,
    inspector: &'a MarkerInspector,
}

fn upper(node: &NodeObservation) -> TaggedPath {
    TaggedPath::new(Root::Upper, node.relative_path())
}

fn lower(node: &NodeObservation) -> TaggedPath {
    TaggedPath::new(Root::Lower, node.relative_path())
}

fn unsupported(node: &NodeObservation, reason: &'static str) -> EngineError {
    EngineError::UnsupportedLayering {
        path: node.primary_path().to_path_buf(),
        reason,
    }
}

impl MergeVisitor<'_> {
    /// Clears whatever the lower layer has at the node's path.
    fn remove_lower(&mut self, node: &NodeObservation) {
        match node.secondary() {
            Some(stat) if stat.kind.is_dir() => self.plan.push(Action::RemoveTree(lower(node))),
            Some(_) => self.plan.push(Action::Remove(lower(node))),
            None => {}
        }
    }

    fn move_down(&mut self, node: &NodeObservation) {
        self.plan.push(Action::Move {
            from: upper(node),
            to: lower(node),
        });
    }
}

impl Visitor for MergeVisitor<'_> {
    type Error = EngineError;

    fn on_enter_dir(&mut self, node: &NodeObservation) -> EngineResult<Flow> {
        if self.inspector.is_redirect(node.primary_path())? {
            return Err(unsupported(node, "redirect"));
        }

        match node.secondary() {
            Some(stat) if stat.kind.is_dir() => {
                if !self.inspector.is_opaque(node.primary_path())? {
                    if !permissions_identical(stat, node.primary()) {
                        self.plan.push(Action::ChangePermissionsLike {
                            reference: upper(node),
                            target: lower(node),
                        });
                    }
                    return Ok(Flow::Continue);
                }
                if node.is_root() {
                    return Err(unsupported(node, "opaque root"));
                }
                self.plan.push(Action::RemoveTree(lower(node)));
            }
            Some(_) => self.plan.push(Action::Remove(lower(node))),
            None => {}
        }

        self.move_down(node);
        Ok(Flow::SkipSubtree)
    }

    fn on_leave_dir(&mut self, node: &NodeObservation) -> EngineResult<()> {
        // Only reached for directories merged entry by entry, which are now
        // empty in the upper layer.
        if !node.is_root() && node.secondary().is_some_and(|stat| stat.kind.is_dir()) {
            self.plan.push(Action::RemoveDir(upper(node)));
        }
        Ok(())
    }

    fn on_file(&mut self, node: &NodeObservation) -> EngineResult<()> {
        let markers = self.inspector.markers(node.primary_path())?;
        if markers.metacopy {
            return Err(unsupported(node, "metacopy"));
        }
        if markers.redirect {
            return Err(unsupported(node, "redirect"));
        }
        self.remove_lower(node);
        self.move_down(node);
        Ok(())
    }

    fn on_symlink(&mut self, node: &NodeObservation) -> EngineResult<()> {
        self.remove_lower(node);
        self.move_down(node);
        Ok(())
    }

    fn on_whiteout(&mut self, node: &NodeObservation) -> EngineResult<()> {
        self.remove_lower(node);
        self.plan.push(Action::Remove(upper(node)));
        Ok(())
    }
}
