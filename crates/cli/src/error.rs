use std::io;
use std::path::PathBuf;

use engine::{ConfigError, EngineError};

/// Failures reported by [`run`](crate::run).
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid command line.
    #[error("{0}")]
    Usage(String),

    /// The directories given on the command line are unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The upper layer does not accept overlay attributes.
    #[error("cannot write {prefix}* xattr in '{}'; try running again as root", .path.display())]
    XattrProbe {
        /// Attribute prefix that was probed.
        prefix: &'static str,
        /// Directory the probe ran in.
        path: PathBuf,
    },

    /// The user declined to continue.
    #[error("aborted at user request")]
    Declined,

    /// The script file could not be created or written.
    #[error("script file '{}' cannot be created: {source}", .path.display())]
    Script {
        /// Script path or directory.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The operation itself failed.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl CliError {
    /// Returns `true` when the failure happened while walking the layers.
    pub(crate) const fn aborted_operation(&self) -> bool {
        match self {
            Self::Engine(error) => error.is_fatal_walk_error(),
            _ => false,
        }
    }

    /// Returns `true` when the help hint should follow the diagnostic.
    pub(crate) const fn suggests_help(&self) -> bool {
        matches!(self, Self::Usage(_) | Self::Config(_))
    }
}
