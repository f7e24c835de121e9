use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;

use crate::error::MetadataError;

/// Owner, group and other rwx bits plus the sticky bit.
///
/// Setuid and setgid are deliberately left out of permission identity.
const PERMISSION_MASK: u32 = 0o1777;

/// Device number the overlay driver uses for whiteouts.
const WHITEOUT_RDEV: u64 = 0;

/// Fallback chunk size when the filesystem reports a zero block size.
const DEFAULT_BLKSIZE: u64 = 4096;

/// Node classification used by every traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A directory.
    Directory,
    /// A regular file.
    Regular,
    /// A symbolic link (never followed).
    Symlink,
    /// A character device with device number `0`.
    Whiteout,
    /// FIFO, socket, block device, or non-whiteout character device.
    Other,
}

impl FileKind {
    /// Classifies `metadata` obtained without following symlinks.
    #[must_use]
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        let file_type = metadata.file_type();
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::Regular
        } else if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_char_device() && metadata.rdev() == WHITEOUT_RDEV {
            Self::Whiteout
        } else {
            Self::Other
        }
    }

    /// Singular description, as used by `diff --brief` type mismatch lines.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Regular => "regular file",
            Self::Symlink => "symbolic link",
            Self::Whiteout | Self::Other => "special file",
        }
    }

    /// Plural, capitalised description, as used by `diff --brief` content lines.
    #[must_use]
    pub const fn describe_plural(self) -> &'static str {
        match self {
            Self::Directory => "Directories",
            Self::Regular => "Files",
            Self::Symlink => "Symbolic links",
            Self::Whiteout | Self::Other => "Special files",
        }
    }

    /// Returns `true` for directories.
    #[must_use]
    pub const fn is_dir(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// Snapshot of the `lstat` fields the reconciliation algorithms consult.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeStat {
    /// Node classification.
    pub kind: FileKind,
    /// Size in bytes.
    pub size: u64,
    /// Preferred I/O block size.
    pub blksize: u64,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Full `st_mode`, including type bits.
    pub mode: u32,
}

impl NodeStat {
    /// Builds a snapshot from metadata obtained without following symlinks.
    #[must_use]
    pub fn from_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            kind: FileKind::from_metadata(metadata),
            size: metadata.size(),
            blksize: metadata.blksize(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            mode: metadata.mode(),
        }
    }

    /// Stats `path` without following a trailing symlink.
    pub fn lstat(path: &Path) -> Result<Self, MetadataError> {
        fs::symlink_metadata(path)
            .map(|metadata| Self::from_metadata(&metadata))
            .map_err(|error| MetadataError::new("stat", path, error))
    }

    /// Preferred block size, never zero.
    #[must_use]
    pub const fn effective_blksize(&self) -> u64 {
        if self.blksize == 0 {
            DEFAULT_BLKSIZE
        } else {
            self.blksize
        }
    }
}

/// Stats `path` without following symlinks, mapping "does not exist" to `None`.
///
/// Both a missing final component and a non-directory ancestor count as
/// absence. Every other failure is returned unchanged.
pub fn stat_if_exists(path: &Path) -> io::Result<Option<NodeStat>> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => Ok(Some(NodeStat::from_metadata(&metadata))),
        Err(error) if is_absent(&error) => Ok(None),
        Err(error) => Err(error),
    }
}

fn is_absent(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::NotFound || error.raw_os_error() == Some(libc::ENOTDIR)
}

/// Permission bits that take part in permission identity.
#[must_use]
pub const fn permission_bits(stat: &NodeStat) -> u32 {
    stat.mode & PERMISSION_MASK
}

/// Returns `true` when both nodes share permission bits, owner and group.
#[must_use]
pub const fn permissions_identical(lower: &NodeStat, upper: &NodeStat) -> bool {
    permission_bits(lower) == permission_bits(upper)
        && lower.uid == upper.uid
        && lower.gid == upper.gid
}
