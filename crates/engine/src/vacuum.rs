//! Removal of upper entries that add nothing over the lower layer.

use std::path::Path;

use metadata::{FileKind, MarkerInspector, permissions_identical};
use walk::{DualWalkBuilder, Flow, NodeObservation, Visitor, drive};

use crate::compare::{regular_files_identical, symlinks_identical};
use crate::error::{EngineError, EngineResult};
use crate::plan::{Action, Plan, Root, TaggedPath};

/// Plans the removal of redundant upper entries.
///
/// An upper file or symbolic link is redundant when its lower peer has the
/// same kind, permissions and content. An upper directory is removed only if
/// it ends up empty and its lower peer has the same permissions. Opaque
/// directories are left untouched.
///
/// # Errors
///
/// Any traversal, marker or comparison failure aborts planning; no plan is
/// returned in that case.
pub fn vacuum(lower: &Path, upper: &Path, inspector: &MarkerInspector) -> EngineResult<Plan> {
    logging::trace_plan!(info, lower = %lower.display(), upper = %upper.display(), "vacuum");
    let mut visitor = VacuumVisitor {
        plan: Plan::new(),
        inspector,
    };
    drive(DualWalkBuilder::new(upper, lower).build()?, &mut visitor)?;
    Ok(visitor.plan)
}

struct VacuumVisitor<'a> {
    plan: Plan,
    inspector: &'a MarkerInspector,
}

impl VacuumVisitor<'_> {
    fn lower_of_kind<'n>(
        node: &'n NodeObservation,
        kind: FileKind,
    ) -> Option<&'n metadata::NodeStat> {
        node.secondary().filter(|lower| lower.kind == kind)
    }

    fn upper(node: &NodeObservation) -> TaggedPath {
        TaggedPath::new(Root::Upper, node.relative_path())
    }
}

impl Visitor for VacuumVisitor<'_> {
    type Error = EngineError;

    fn on_enter_dir(&mut self, node: &NodeObservation) -> EngineResult<Flow> {
        if self.inspector.is_opaque_directory(node.primary_path())? {
            logging::trace_plan!(debug, path = %node.primary_path().display(), "keeping opaque directory");
            return Ok(Flow::SkipSubtree);
        }
        Ok(Flow::Continue)
    }

    fn on_leave_dir(&mut self, node: &NodeObservation) -> EngineResult<()> {
        if node.is_root() {
            return Ok(());
        }
        if let Some(lower) = Self::lower_of_kind(node, FileKind::Directory)
            && permissions_identical(lower, node.primary())
        {
            self.plan.push(Action::RemoveDirIfEmpty(Self::upper(node)));
        }
        Ok(())
    }

    fn on_file(&mut self, node: &NodeObservation) -> EngineResult<()> {
        let Some(lower) = Self::lower_of_kind(node, FileKind::Regular) else {
            return Ok(());
        };
        if permissions_identical(lower, node.primary())
            && regular_files_identical(
                node.secondary_path(),
                lower,
                node.primary_path(),
                node.primary(),
                self.inspector,
            )?
        {
            self.plan.push(Action::Remove(Self::upper(node)));
        }
        Ok(())
    }

    fn on_symlink(&mut self, node: &NodeObservation) -> EngineResult<()> {
        let Some(lower) = Self::lower_of_kind(node, FileKind::Symlink) else {
            return Ok(());
        };
        if permissions_identical(lower, node.primary())
            && symlinks_identical(node.secondary_path(), node.primary_path())?
        {
            self.plan.push(Action::Remove(Self::upper(node)));
        }
        Ok(())
    }
}
