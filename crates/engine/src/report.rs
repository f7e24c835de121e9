//! Line-oriented change report written by `diff`.
//!
//! Two families of output exist. The default family prints one
//! `Added:`/`Removed:`/`Modified:` line per relative path, with a trailing
//! `/` on directories. The brief family mimics `diff --brief --recursive
//! --no-dereference` and names absolute paths in both layers.

use std::io::Write;
use std::path::Path;

use metadata::FileKind;

use crate::error::{EngineError, EngineResult};

/// How much detail `diff` reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportStyle {
    /// One line per changed entry; one-sided directories are reported once.
    #[default]
    Default,
    /// Like [`Default`](Self::Default), but one-sided directories are
    /// enumerated in full.
    Verbose,
    /// `diff --brief` compatible lines.
    Brief,
}

impl ReportStyle {
    /// Returns `true` for [`ReportStyle::Verbose`].
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Returns `true` for [`ReportStyle::Brief`].
    #[must_use]
    pub const fn is_brief(self) -> bool {
        matches!(self, Self::Brief)
    }
}

/// Writes report lines in a fixed [`ReportStyle`].
pub struct DiffReport<W: Write> {
    out: W,
    style: ReportStyle,
    lines: usize,
}

impl<W: Write> DiffReport<W> {
    /// Creates a report writing to `out`.
    pub fn new(out: W, style: ReportStyle) -> Self {
        Self {
            out,
            style,
            lines: 0,
        }
    }

    /// Style of this report.
    #[must_use]
    pub const fn style(&self) -> ReportStyle {
        self.style
    }

    /// Number of lines written so far.
    #[must_use]
    pub const fn lines(&self) -> usize {
        self.lines
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Reports a lower entry that no longer exists in the merged view.
    pub fn removed(&mut self, lower_path: &Path, relative: &Path, kind: FileKind) -> EngineResult<()> {
        if self.style.is_brief() {
            self.only_in(lower_path)
        } else {
            self.line(format_args!("Removed: {}", RelativeDisplay { relative, kind }))
        }
    }

    /// Reports an upper entry with no lower counterpart.
    pub fn added(&mut self, upper_path: &Path, relative: &Path, kind: FileKind) -> EngineResult<()> {
        if self.style.is_brief() {
            self.only_in(upper_path)
        } else {
            self.line(format_args!("Added: {}", RelativeDisplay { relative, kind }))
        }
    }

    /// Reports an entry whose kind differs between the layers.
    ///
    /// A replaced lower directory is not reported as removed here; callers
    /// report hidden lower directories separately.
    pub fn replaced(
        &mut self,
        lower_path: &Path,
        lower_kind: FileKind,
        upper_path: &Path,
        upper_kind: FileKind,
        relative: &Path,
    ) -> EngineResult<()> {
        if self.style.is_brief() {
            return self.line(format_args!(
                "File {} is a {} while file {} is a {}",
                lower_path.display(),
                lower_kind.describe(),
                upper_path.display(),
                upper_kind.describe()
            ));
        }
        if !lower_kind.is_dir() {
            self.removed(lower_path, relative, lower_kind)?;
        }
        self.added(upper_path, relative, upper_kind)
    }

    /// Reports an entry present in both layers with differing content or
    /// permissions.
    ///
    /// The brief style only reports content differences.
    pub fn modified(
        &mut self,
        lower_path: &Path,
        upper_path: &Path,
        relative: &Path,
        kind: FileKind,
        content_identical: bool,
    ) -> EngineResult<()> {
        if self.style.is_brief() {
            if content_identical {
                return Ok(());
            }
            return self.line(format_args!(
                "{} {} and {} differ",
                kind.describe_plural(),
                lower_path.display(),
                upper_path.display()
            ));
        }
        self.line(format_args!("Modified: {}", RelativeDisplay { relative, kind }))
    }

    fn only_in(&mut self, path: &Path) -> EngineResult<()> {
        let parent = path.parent().unwrap_or(path);
        let name = path.file_name().unwrap_or_default();
        self.line(format_args!(
            "Only in {}: {}",
            parent.display(),
            Path::new(name).display()
        ))
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) -> EngineResult<()> {
        logging::trace_report!(trace, "{args}");
        writeln!(self.out, "{args}").map_err(EngineError::Output)?;
        self.lines += 1;
        Ok(())
    }
}

/// Relative path as printed by the default styles: `.` for the root and a
/// trailing `/` on directories.
struct RelativeDisplay<'a> {
    relative: &'a Path,
    kind: FileKind,
}

impl std::fmt::Display for RelativeDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.relative.as_os_str().is_empty() {
            f.write_str(".")?;
        } else {
            write!(f, "{}", self.relative.display())?;
        }
        if self.kind.is_dir() {
            f.write_str("/")?;
        }
        Ok(())
    }
}
