//! crates/logging/src/levels.rs
//! Flag enum and level structure for per-subsystem verbosity.

use std::fmt;

/// Diagnostic categories, one per subsystem.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogFlag {
    /// Dual-tree and one-sided traversal.
    Walk,
    /// Overlay extended attribute inspection.
    Marker,
    /// File content and symlink target comparison.
    Compare,
    /// Planned actions.
    Plan,
    /// Diff report classification.
    Report,
    /// Mount table inspection and root validation.
    Mount,
}

impl LogFlag {
    /// Every flag, in display order.
    pub const ALL: [Self; 6] = [
        Self::Walk,
        Self::Marker,
        Self::Compare,
        Self::Plan,
        Self::Report,
        Self::Mount,
    ];

    /// Returns the tracing target used by events in this category.
    #[must_use]
    pub const fn target(self) -> &'static str {
        match self {
            Self::Walk => "ovl::walk",
            Self::Marker => "ovl::marker",
            Self::Compare => "ovl::compare",
            Self::Plan => "ovl::plan",
            Self::Report => "ovl::report",
            Self::Mount => "ovl::mount",
        }
    }

    /// Short lowercase name, as accepted by [`LogFlag::from_name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Marker => "marker",
            Self::Compare => "compare",
            Self::Plan => "plan",
            Self::Report => "report",
            Self::Mount => "mount",
        }
    }

    /// Looks a flag up by its short name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }

    /// Maps a tracing target back to its flag.
    #[must_use]
    pub fn from_target(target: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.target() == target)
    }
}

impl fmt::Display for LogFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Verbosity level for each flag.
///
/// `0` keeps only warnings and errors, `1` adds info events, `2` adds debug
/// events and anything above adds trace events.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogLevels {
    /// Traversal level.
    pub walk: u8,
    /// Marker inspection level.
    pub marker: u8,
    /// Content comparison level.
    pub compare: u8,
    /// Plan emission level.
    pub plan: u8,
    /// Report classification level.
    pub report: u8,
    /// Mount inspection level.
    pub mount: u8,
}

impl LogLevels {
    /// Returns the level stored for `flag`.
    #[must_use]
    pub const fn get(&self, flag: LogFlag) -> u8 {
        match flag {
            LogFlag::Walk => self.walk,
            LogFlag::Marker => self.marker,
            LogFlag::Compare => self.compare,
            LogFlag::Plan => self.plan,
            LogFlag::Report => self.report,
            LogFlag::Mount => self.mount,
        }
    }

    /// Overwrites the level stored for `flag`.
    pub fn set(&mut self, flag: LogFlag, level: u8) {
        let slot = match flag {
            LogFlag::Walk => &mut self.walk,
            LogFlag::Marker => &mut self.marker,
            LogFlag::Compare => &mut self.compare,
            LogFlag::Plan => &mut self.plan,
            LogFlag::Report => &mut self.report,
            LogFlag::Mount => &mut self.mount,
        };
        *slot = level;
    }

    /// Sets every flag to `level`.
    pub fn set_all(&mut self, level: u8) {
        for flag in LogFlag::ALL {
            self.set(flag, level);
        }
    }
}
