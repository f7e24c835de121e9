use std::fmt;
use std::path::{Path, PathBuf};

/// Directory tree an action operand belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Root {
    /// The lower layer.
    Lower,
    /// The upper layer.
    Upper,
    /// The mounted overlay.
    Mount,
    /// A new lower layer being materialised.
    LowerNew,
    /// A new upper layer being materialised.
    UpperNew,
}

impl Root {
    /// Every root, in the order rendered scripts declare them.
    pub const ALL: [Self; 5] = [
        Self::Lower,
        Self::Upper,
        Self::Mount,
        Self::LowerNew,
        Self::UpperNew,
    ];

    /// Shell variable name used by rendered scripts.
    #[must_use]
    pub const fn variable(self) -> &'static str {
        match self {
            Self::Lower => "LOWERDIR",
            Self::Upper => "UPPERDIR",
            Self::Mount => "MOUNTDIR",
            Self::LowerNew => "LOWERNEW",
            Self::UpperNew => "UPPERNEW",
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lower => "lowerdir",
            Self::Upper => "upperdir",
            Self::Mount => "mountdir",
            Self::LowerNew => "lowernew",
            Self::UpperNew => "uppernew",
        })
    }
}

/// A path relative to one of the layer roots.
///
/// An empty relative path denotes the root itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaggedPath {
    root: Root,
    relative: PathBuf,
}

impl TaggedPath {
    /// Tags `relative` with `root`.
    pub fn new(root: Root, relative: impl Into<PathBuf>) -> Self {
        Self {
            root,
            relative: relative.into(),
        }
    }

    /// Root the path belongs to.
    #[must_use]
    pub const fn root(&self) -> Root {
        self.root
    }

    /// Path relative to the root.
    #[must_use]
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Same relative path under another root.
    #[must_use]
    pub fn with_root(&self, root: Root) -> Self {
        Self {
            root,
            relative: self.relative.clone(),
        }
    }
}

impl fmt::Display for TaggedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relative.as_os_str().is_empty() {
            write!(f, "${}", self.root.variable())
        } else {
            write!(f, "${}/{}", self.root.variable(), self.relative.display())
        }
    }
}

/// A single planned filesystem mutation.
///
/// Removal verbs tolerate a target that is already gone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Remove a non-directory.
    Remove(TaggedPath),
    /// Remove a node and, for directories, everything below it.
    RemoveTree(TaggedPath),
    /// Remove a directory that must already be empty.
    RemoveDir(TaggedPath),
    /// Remove a directory only if it is empty.
    RemoveDirIfEmpty(TaggedPath),
    /// Rename `from` onto `to`, treating `to` as a plain destination.
    Move {
        /// Node to move.
        from: TaggedPath,
        /// Destination path.
        to: TaggedPath,
    },
    /// Recursively copy `from` to `to`, preserving metadata.
    Copy {
        /// Node to copy.
        from: TaggedPath,
        /// Destination path.
        to: TaggedPath,
    },
    /// Give `target` the permission bits and ownership of `reference`.
    ChangePermissionsLike {
        /// Node whose permissions are copied.
        reference: TaggedPath,
        /// Node whose permissions change.
        target: TaggedPath,
    },
}

impl Action {
    /// Short verb name used in logs.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Remove(_) => "remove",
            Self::RemoveTree(_) => "remove-tree",
            Self::RemoveDir(_) => "remove-dir",
            Self::RemoveDirIfEmpty(_) => "remove-dir-if-empty",
            Self::Move { .. } => "move",
            Self::Copy { .. } => "copy",
            Self::ChangePermissionsLike { .. } => "change-permissions",
        }
    }

    /// Rewrites every operand tagged `from` so it is tagged `to`.
    #[must_use]
    pub fn retarget(self, from: Root, to: Root) -> Self {
        let map = |path: TaggedPath| {
            if path.root == from {
                path.with_root(to)
            } else {
                path
            }
        };
        match self {
            Self::Remove(path) => Self::Remove(map(path)),
            Self::RemoveTree(path) => Self::RemoveTree(map(path)),
            Self::RemoveDir(path) => Self::RemoveDir(map(path)),
            Self::RemoveDirIfEmpty(path) => Self::RemoveDirIfEmpty(map(path)),
            Self::Move { from: source, to: dest } => Self::Move {
                from: map(source),
                to: map(dest),
            },
            Self::Copy { from: source, to: dest } => Self::Copy {
                from: map(source),
                to: map(dest),
            },
            Self::ChangePermissionsLike { reference, target } => Self::ChangePermissionsLike {
                reference: map(reference),
                target: map(target),
            },
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove(path)
            | Self::RemoveTree(path)
            | Self::RemoveDir(path)
            | Self::RemoveDirIfEmpty(path) => write!(f, "{} {path}", self.verb()),
            Self::Move { from, to } | Self::Copy { from, to } => {
                write!(f, "{} {from} -> {to}", self.verb())
            }
            Self::ChangePermissionsLike { reference, target } => {
                write!(f, "{} {target} like {reference}", self.verb())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_path_renders_with_variable() {
        assert_eq!(TaggedPath::new(Root::Lower, "a/b").to_string(), "$LOWERDIR/a/b");
        assert_eq!(TaggedPath::new(Root::UpperNew, "").to_string(), "$UPPERNEW");
    }

    #[test]
    fn retarget_only_touches_matching_root() {
        let action = Action::Copy {
            from: TaggedPath::new(Root::Mount, "f"),
            to: TaggedPath::new(Root::Upper, "f"),
        };
        assert_eq!(
            action.retarget(Root::Upper, Root::UpperNew),
            Action::Copy {
                from: TaggedPath::new(Root::Mount, "f"),
                to: TaggedPath::new(Root::UpperNew, "f"),
            }
        );
    }

    #[test]
    fn display_is_compact() {
        let action = Action::Move {
            from: TaggedPath::new(Root::Upper, "x"),
            to: TaggedPath::new(Root::Lower, "x"),
        };
        assert_eq!(action.to_string(), "move $UPPERDIR/x -> $LOWERDIR/x");
    }
}
