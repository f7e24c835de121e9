use metadata::{FileKind, NodeStat};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Result of a single-tree traversal step.
#[derive(Clone, Debug)]
pub struct WalkEntry {
    pub(crate) full_path: PathBuf,
    pub(crate) relative_path: PathBuf,
    pub(crate) stat: NodeStat,
    pub(crate) depth: usize,
}

impl WalkEntry {
    /// Returns the absolute path to the filesystem entry.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Returns the path relative to the traversal root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Snapshot taken without following symlinks.
    #[must_use]
    pub const fn stat(&self) -> &NodeStat {
        &self.stat
    }

    /// Node classification.
    #[must_use]
    pub const fn kind(&self) -> FileKind {
        self.stat.kind
    }

    /// Reports the depth of the entry relative to the root (root depth is `0`).
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Indicates whether this entry corresponds to the traversal root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.depth == 0
    }
}

/// A node of the walked tree together with its peer in the other tree.
///
/// Both paths share [`relative_path`](Self::relative_path). The peer
/// snapshot is `None` when the peer path, or one of its ancestors, does not
/// exist.
#[derive(Clone, Debug)]
pub struct NodeObservation {
    pub(crate) relative_path: PathBuf,
    pub(crate) primary_path: PathBuf,
    pub(crate) secondary_path: PathBuf,
    pub(crate) primary: NodeStat,
    pub(crate) secondary: Option<NodeStat>,
    pub(crate) depth: usize,
}

impl NodeObservation {
    /// Path relative to both roots; empty for the roots themselves.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Path of the node inside the walked tree.
    #[must_use]
    pub fn primary_path(&self) -> &Path {
        &self.primary_path
    }

    /// Path of the peer inside the other tree.
    #[must_use]
    pub fn secondary_path(&self) -> &Path {
        &self.secondary_path
    }

    /// Snapshot of the walked node.
    #[must_use]
    pub const fn primary(&self) -> &NodeStat {
        &self.primary
    }

    /// Snapshot of the peer, if it exists.
    #[must_use]
    pub const fn secondary(&self) -> Option<&NodeStat> {
        self.secondary.as_ref()
    }

    /// Kind of the peer, if it exists.
    #[must_use]
    pub fn secondary_kind(&self) -> Option<FileKind> {
        self.secondary.map(|stat| stat.kind)
    }

    /// Final component of the relative path, `None` for the roots.
    #[must_use]
    pub fn file_name(&self) -> Option<&OsStr> {
        self.relative_path.file_name()
    }

    /// Depth below the roots (the roots are at depth `0`).
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Indicates whether this observation describes the two roots.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.depth == 0
    }
}
