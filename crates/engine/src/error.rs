//! Common error types for the engine crate.

use std::io;
use std::path::{Path, PathBuf};

use metadata::MetadataError;
use walk::WalkError;

use crate::config::ConfigError;
use crate::plan::Root;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that abort an overlay operation.
///
/// Every variant is fatal: the operation stops at the first error and any
/// plan or report produced so far must be discarded.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid configuration detected before any walk started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Traversal failed.
    #[error(transparent)]
    Walk(#[from] WalkError),

    /// Reading metadata or an overlay attribute failed.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// An I/O action on a specific path failed.
    #[error("failed to {action} '{}': {source}", .path.display())]
    Io {
        /// Action being performed.
        action: &'static str,
        /// Path the action was applied to.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Writing the report or the rendered plan failed.
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),

    /// The upper layer uses a feature the operation refuses to handle.
    #[error("found {reason} on '{}'; merging {reason} is not supported", .path.display())]
    UnsupportedLayering {
        /// Offending upper node.
        path: PathBuf,
        /// Marker that triggered the refusal, e.g. `"redirect"`.
        reason: &'static str,
    },

    /// A FIFO, socket or device node was found where only files are allowed.
    #[error(
        "'{}' is a special file (device, socket or pipe) and cannot be handled",
        .path.display()
    )]
    UnsupportedNode {
        /// Offending node.
        path: PathBuf,
    },

    /// A marked upper node has no counterpart in the mounted view.
    #[error("'{}' does not exist in the mounted overlay", .path.display())]
    MissingMountEntry {
        /// Expected path inside the mount.
        path: PathBuf,
    },

    /// Two files of equal size produced reads of different lengths.
    #[error("unexpected size difference while reading '{}'", .path.display())]
    UnexpectedSizeChange {
        /// File whose size changed during the comparison.
        path: PathBuf,
    },

    /// A symbolic link target could not be resolved.
    #[error("symbolic link '{}' cannot be resolved", .path.display())]
    UnresolvableSymlink {
        /// Offending link.
        path: PathBuf,
    },

    /// A plan references a root that has no configured directory.
    #[error("no directory configured for {root}")]
    UnboundRoot {
        /// Root tag without a directory.
        root: Root,
    },
}

impl EngineError {
    /// Creates an I/O error with action and path context.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unsupported_node(path: &Path) -> Self {
        Self::UnsupportedNode {
            path: path.to_path_buf(),
        }
    }

    /// Returns `true` when the error was raised by a traversal or handler
    /// rather than by configuration.
    #[must_use]
    pub const fn is_fatal_walk_error(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Extension trait for mapping I/O results to [`EngineError::Io`].
pub(crate) trait IoResultExt<T> {
    /// Attaches `action` and `path` to an I/O failure.
    fn with_path(self, action: &'static str, path: &Path) -> EngineResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, action: &'static str, path: &Path) -> EngineResult<T> {
        self.map_err(|error| EngineError::io(action, path, error))
    }
}
