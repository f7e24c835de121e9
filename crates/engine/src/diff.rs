//! Change report of an upper layer against its lower layer.

use std::io::Write;
use std::path::Path;

use metadata::{FileKind, MarkerInspector, permissions_identical};
use walk::{DualWalkBuilder, Flow, NodeObservation, Visitor, drive};

use crate::compare::{regular_files_identical, symlinks_identical};
use crate::deleted::{DeletedMode, DeletedSubtreeReporter};
use crate::error::{EngineError, EngineResult};
use crate::report::{DiffReport, ReportStyle};

/// Reports how `upper` changes `lower`, writing lines to `out`.
///
/// Returns the writer once the whole tree has been reported.
///
/// # Errors
///
/// Any traversal, marker, comparison or write failure aborts the report.
/// Lines written before the failure must not be relied upon.
pub fn diff<W: Write>(
    lower: &Path,
    upper: &Path,
    style: ReportStyle,
    inspector: &MarkerInspector,
    out: W,
) -> EngineResult<W> {
    logging::trace_report!(
        info,
        lower = %lower.display(),
        upper = %upper.display(),
        ?style,
        "diff"
    );
    let mut visitor = DiffVisitor {
        report: DiffReport::new(out, style),
        inspector,
    };
    drive(DualWalkBuilder::new(upper, lower).build()?, &mut visitor)?;
    logging::trace_report!(debug, lines = visitor.report.lines(), "diff complete");
    Ok(visitor.report.into_inner())
}

struct DiffVisitor<'a, W: Write> {
    report: DiffReport<W>,
    inspector: &'a MarkerInspector,
}

const fn is_special(kind: FileKind) -> bool {
    matches!(kind, FileKind::Whiteout | FileKind::Other)
}

impl<W: Write> DiffVisitor<'_, W> {
    /// Reports the lower directory hidden behind `node`, whose upper kind is
    /// `upper_kind`.
    fn hidden_lower(&mut self, node: &NodeObservation, upper_kind: FileKind) -> EngineResult<()> {
        let style = self.report.style();
        let collapsed = style.is_brief() && upper_kind.is_dir();
        if !style.is_verbose() && !collapsed {
            // A brief type change is reported by `replaced` instead.
            if !style.is_brief() || upper_kind == FileKind::Whiteout {
                self.report.removed(
                    node.secondary_path(),
                    node.relative_path(),
                    FileKind::Directory,
                )?;
            }
            return Ok(());
        }
        let mode = if collapsed {
            DeletedMode::Collapsed
        } else {
            DeletedMode::Full
        };
        DeletedSubtreeReporter::new(mode).report(
            node.secondary_path(),
            node.relative_path(),
            &mut self.report,
        )
    }

    fn replaced(&mut self, node: &NodeObservation, lower_kind: FileKind) -> EngineResult<()> {
        self.report.replaced(
            node.secondary_path(),
            lower_kind,
            node.primary_path(),
            node.primary().kind,
            node.relative_path(),
        )
    }

    fn added(&mut self, node: &NodeObservation) -> EngineResult<()> {
        self.report
            .added(node.primary_path(), node.relative_path(), node.primary().kind)
    }

    fn modified(&mut self, node: &NodeObservation, content_identical: bool) -> EngineResult<()> {
        self.report.modified(
            node.secondary_path(),
            node.primary_path(),
            node.relative_path(),
            node.primary().kind,
            content_identical,
        )
    }
}

impl<W: Write> Visitor for DiffVisitor<'_, W> {
    type Error = EngineError;

    fn on_enter_dir(&mut self, node: &NodeObservation) -> EngineResult<Flow> {
        let style = self.report.style();
        let mut opaque = false;
        match node.secondary() {
            Some(lower) if lower.kind.is_dir() => {
                opaque = self.inspector.is_opaque_directory(node.primary_path())?;
                if !opaque {
                    if !permissions_identical(lower, node.primary()) {
                        self.modified(node, true)?;
                    }
                    return Ok(Flow::Continue);
                }
                self.hidden_lower(node, FileKind::Directory)?;
            }
            Some(lower) if is_special(lower.kind) => {
                return Err(EngineError::unsupported_node(node.secondary_path()));
            }
            Some(lower) => self.replaced(node, lower.kind)?,
            None => {}
        }

        if node.secondary().is_none() || (opaque && !style.is_brief()) {
            self.added(node)?;
        }
        if style.is_verbose() || (style.is_brief() && opaque) {
            Ok(Flow::Continue)
        } else {
            Ok(Flow::SkipSubtree)
        }
    }

    fn on_file(&mut self, node: &NodeObservation) -> EngineResult<()> {
        match node.secondary() {
            Some(lower) if lower.kind == FileKind::Regular => {
                let identical = regular_files_identical(
                    node.secondary_path(),
                    lower,
                    node.primary_path(),
                    node.primary(),
                    self.inspector,
                )?;
                if !(identical && permissions_identical(lower, node.primary())) {
                    self.modified(node, identical)?;
                }
                Ok(())
            }
            Some(lower) if lower.kind.is_dir() => {
                self.hidden_lower(node, FileKind::Regular)?;
                self.replaced(node, FileKind::Directory)
            }
            Some(lower) if lower.kind == FileKind::Symlink => self.replaced(node, lower.kind),
            Some(_) => Err(EngineError::unsupported_node(node.secondary_path())),
            None => self.added(node),
        }
    }

    fn on_symlink(&mut self, node: &NodeObservation) -> EngineResult<()> {
        match node.secondary() {
            Some(lower) if lower.kind == FileKind::Symlink => {
                let identical = symlinks_identical(node.secondary_path(), node.primary_path())?;
                if !(identical && permissions_identical(lower, node.primary())) {
                    self.modified(node, identical)?;
                }
                Ok(())
            }
            Some(lower) if lower.kind.is_dir() => {
                self.hidden_lower(node, FileKind::Symlink)?;
                self.replaced(node, FileKind::Directory)
            }
            Some(lower) if lower.kind == FileKind::Regular => self.replaced(node, lower.kind),
            Some(_) => Err(EngineError::unsupported_node(node.secondary_path())),
            None => self.added(node),
        }
    }

    fn on_whiteout(&mut self, node: &NodeObservation) -> EngineResult<()> {
        match node.secondary() {
            Some(lower) if lower.kind.is_dir() => self.hidden_lower(node, FileKind::Whiteout),
            Some(lower) => {
                self.report
                    .removed(node.secondary_path(), node.relative_path(), lower.kind)
            }
            // Whiteout of a path the lower layer never had.
            None => Ok(()),
        }
    }
}
