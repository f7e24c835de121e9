//! Enumeration of lower subtrees hidden by an opaque directory or a whiteout.

use std::io::Write;
use std::path::Path;

use metadata::FileKind;
use walk::WalkBuilder;

use crate::error::{EngineError, EngineResult};
use crate::report::DiffReport;

/// How much of a hidden subtree is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletedMode {
    /// The subtree root and every descendant, directories before their
    /// contents.
    Full,
    /// Only the direct children of the subtree root; child directories are
    /// reported once and not descended into.
    Collapsed,
}

/// One-sided walker reporting every member of a hidden lower subtree as
/// removed.
#[derive(Clone, Copy, Debug)]
pub struct DeletedSubtreeReporter {
    mode: DeletedMode,
}

impl DeletedSubtreeReporter {
    /// Creates a reporter in `mode`.
    #[must_use]
    pub const fn new(mode: DeletedMode) -> Self {
        Self { mode }
    }

    /// Reports the subtree rooted at `lower_path`, whose path relative to the
    /// lower root is `relative`.
    ///
    /// # Errors
    ///
    /// Fails on traversal errors and on any member that is not a regular
    /// file, directory or symbolic link.
    pub fn report<W: Write>(
        &self,
        lower_path: &Path,
        relative: &Path,
        report: &mut DiffReport<W>,
    ) -> EngineResult<()> {
        logging::trace_report!(
            debug,
            path = %lower_path.display(),
            mode = ?self.mode,
            "reporting hidden subtree"
        );

        let mut walker = WalkBuilder::new(lower_path).build()?;
        while let Some(entry) = walker.next() {
            let entry = entry?;
            let kind = entry.kind();
            if !matches!(
                kind,
                FileKind::Directory | FileKind::Regular | FileKind::Symlink
            ) {
                return Err(EngineError::unsupported_node(entry.full_path()));
            }

            if self.mode == DeletedMode::Collapsed {
                if entry.is_root() {
                    continue;
                }
                if kind.is_dir() {
                    walker.skip_current_dir();
                }
            }

            let member = if entry.is_root() {
                relative.to_path_buf()
            } else {
                relative.join(entry.relative_path())
            };
            report.removed(entry.full_path(), &member, kind)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportStyle;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    fn tree() -> tempfile::TempDir {
        let dir = tempdir().expect("tempdir");
        let foo = dir.path().join("foo");
        fs::create_dir_all(foo.join("sub")).expect("mkdir");
        fs::write(foo.join("x"), b"x").expect("write");
        fs::write(foo.join("sub/deep"), b"d").expect("write");
        symlink("x", foo.join("y")).expect("symlink");
        dir
    }

    fn run(style: ReportStyle, mode: DeletedMode, root: &Path) -> String {
        let mut report = DiffReport::new(Vec::new(), style);
        DeletedSubtreeReporter::new(mode)
            .report(&root.join("foo"), Path::new("foo"), &mut report)
            .expect("report");
        String::from_utf8(report.into_inner()).expect("utf-8")
    }

    #[test]
    fn full_mode_lists_directories_before_contents() {
        let dir = tree();
        assert_eq!(
            run(ReportStyle::Verbose, DeletedMode::Full, dir.path()),
            "Removed: foo/\nRemoved: foo/sub/\nRemoved: foo/sub/deep\nRemoved: foo/x\nRemoved: foo/y\n"
        );
    }

    #[test]
    fn collapsed_mode_reports_first_level_only() {
        let dir = tree();
        let parent = dir.path().join("foo");
        assert_eq!(
            run(ReportStyle::Brief, DeletedMode::Collapsed, dir.path()),
            format!(
                "Only in {0}: sub\nOnly in {0}: x\nOnly in {0}: y\n",
                parent.display()
            )
        );
    }

    #[test]
    fn special_member_is_fatal() {
        let dir = tree();
        rustix::fs::mknodat(
            rustix::fs::CWD,
            &dir.path().join("foo/pipe"),
            rustix::fs::FileType::Fifo,
            rustix::fs::Mode::from_raw_mode(0o644),
            0,
        )
        .expect("mkfifo");

        let mut report = DiffReport::new(Vec::new(), ReportStyle::Verbose);
        let error = DeletedSubtreeReporter::new(DeletedMode::Full)
            .report(&dir.path().join("foo"), Path::new("foo"), &mut report)
            .expect_err("fifo aborts the report");
        assert!(matches!(error, EngineError::UnsupportedNode { .. }));
    }
}
