use crate::dual::DualWalker;
use crate::error::WalkError;
use crate::walker::Walker;
use std::path::PathBuf;

/// Configures a single-tree traversal rooted at a specific path.
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    root: PathBuf,
}

impl WalkBuilder {
    /// Creates a new builder that will traverse the provided root path.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Builds a [`Walker`].
    ///
    /// # Errors
    ///
    /// Fails when the root cannot be stat'ed.
    pub fn build(self) -> Result<Walker, WalkError> {
        Walker::new(self.root)
    }
}

/// Configures a traversal of `primary` that observes `peer` alongside it.
#[derive(Clone, Debug)]
pub struct DualWalkBuilder {
    primary: PathBuf,
    peer: PathBuf,
}

impl DualWalkBuilder {
    /// Creates a builder enumerating `primary` and looking up peers under `peer`.
    #[must_use]
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(primary: P, peer: Q) -> Self {
        Self {
            primary: primary.into(),
            peer: peer.into(),
        }
    }

    /// Builds a [`DualWalker`].
    ///
    /// # Errors
    ///
    /// Fails when the primary root cannot be stat'ed, is an unsupported node,
    /// or when its peer cannot be stat'ed for a reason other than absence.
    pub fn build(self) -> Result<DualWalker, WalkError> {
        DualWalker::new(self.primary, self.peer)
    }
}
