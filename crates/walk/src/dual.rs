//! crates/walk/src/dual.rs
//! Lock-step traversal of a primary tree against a peer tree.
//!
//! Only the primary tree is enumerated. For each primary node the peer path
//! is derived by joining the shared relative path onto the peer root and is
//! stat'ed without following symlinks. Children of a node whose peer is not
//! a directory have no peer. Directory events come in pairs
//! ([`Visit::EnterDirectory`] before the children, [`Visit::LeaveDirectory`]
//! after them) unless the subtree is skipped.

use crate::entry::NodeObservation;
use crate::error::WalkError;
use crate::walker::{DirectoryState, absolutize};
use metadata::{FileKind, NodeStat, stat_if_exists};
use std::fs;
use std::path::PathBuf;

/// One step of a dual-tree walk.
#[derive(Clone, Debug)]
pub enum Visit {
    /// A directory, before its children.
    EnterDirectory(NodeObservation),
    /// A directory, after its children.
    LeaveDirectory(NodeObservation),
    /// A regular file.
    File(NodeObservation),
    /// A symbolic link.
    Symlink(NodeObservation),
    /// A whiteout (character device `0/0`).
    Whiteout(NodeObservation),
}

impl Visit {
    /// Observation carried by this event.
    #[must_use]
    pub const fn node(&self) -> &NodeObservation {
        match self {
            Self::EnterDirectory(node)
            | Self::LeaveDirectory(node)
            | Self::File(node)
            | Self::Symlink(node)
            | Self::Whiteout(node) => node,
        }
    }
}

struct Frame {
    listing: DirectoryState,
    node: NodeObservation,
}

/// Depth-first iterator of [`Visit`] events over a primary tree and its peer.
///
/// The walker is single use: once exhausted, or once it has yielded an
/// error, it keeps returning `None`.
pub struct DualWalker {
    peer_root: PathBuf,
    root: Option<NodeObservation>,
    pending: Option<NodeObservation>,
    stack: Vec<Frame>,
    finished: bool,
}

impl DualWalker {
    pub(crate) fn new(primary_root: PathBuf, peer_root: PathBuf) -> Result<Self, WalkError> {
        let primary_root = absolutize(primary_root)?;
        let peer_root = absolutize(peer_root)?;
        logging::trace_walk!(
            debug,
            primary = %primary_root.display(),
            peer = %peer_root.display(),
            "walking tree against peer"
        );

        let metadata = fs::symlink_metadata(&primary_root)
            .map_err(|error| WalkError::root_metadata(primary_root.clone(), error))?;

        let mut walker = Self {
            peer_root: peer_root.clone(),
            root: None,
            pending: None,
            stack: Vec::new(),
            finished: false,
        };
        let root = walker.observe(
            primary_root,
            peer_root,
            PathBuf::new(),
            NodeStat::from_metadata(&metadata),
            0,
            true,
        )?;
        walker.root = Some(root);
        Ok(walker)
    }

    /// Suppresses the children and the [`Visit::LeaveDirectory`] event of the
    /// directory most recently yielded by [`Visit::EnterDirectory`].
    ///
    /// Has no effect after any other event.
    pub fn skip_current_dir(&mut self) {
        if let Some(node) = self.pending.take() {
            logging::trace_walk!(trace, path = %node.relative_path.display(), "skipping subtree");
        }
    }

    fn observe(
        &self,
        primary_path: PathBuf,
        secondary_path: PathBuf,
        relative_path: PathBuf,
        primary: NodeStat,
        depth: usize,
        lookup_peer: bool,
    ) -> Result<NodeObservation, WalkError> {
        if primary.kind == FileKind::Other {
            return Err(WalkError::unsupported_node(primary_path));
        }
        // Below a peer that is not a real directory the peer path would
        // resolve through a symlink or not exist at all.
        let secondary = if lookup_peer {
            stat_if_exists(&secondary_path)
                .map_err(|error| WalkError::peer_metadata(secondary_path.clone(), error))?
        } else {
            None
        };
        Ok(NodeObservation {
            relative_path,
            primary_path,
            secondary_path,
            primary,
            secondary,
            depth,
        })
    }

    fn prepare_node(
        &self,
        primary_path: PathBuf,
        relative_path: PathBuf,
        depth: usize,
        peer_parent_is_dir: bool,
    ) -> Result<NodeObservation, WalkError> {
        logging::trace_walk!(trace, path = %relative_path.display(), "processing node");

        let metadata = fs::symlink_metadata(&primary_path)
            .map_err(|error| WalkError::metadata(primary_path.clone(), error))?;
        let secondary_path = self.peer_root.join(&relative_path);
        self.observe(
            primary_path,
            secondary_path,
            relative_path,
            NodeStat::from_metadata(&metadata),
            depth,
            peer_parent_is_dir,
        )
    }

    fn descend_pending(&mut self) -> Result<(), WalkError> {
        if let Some(node) = self.pending.take() {
            let listing = DirectoryState::new(
                node.primary_path.clone(),
                node.relative_path.clone(),
                node.depth,
            )?;
            self.stack.push(Frame { listing, node });
        }
        Ok(())
    }

    fn emit(&mut self, node: NodeObservation) -> Visit {
        match node.primary.kind {
            FileKind::Directory => {
                self.pending = Some(node.clone());
                Visit::EnterDirectory(node)
            }
            FileKind::Symlink => Visit::Symlink(node),
            FileKind::Whiteout => Visit::Whiteout(node),
            FileKind::Regular | FileKind::Other => Visit::File(node),
        }
    }

    fn fail(&mut self, error: WalkError) -> Option<Result<Visit, WalkError>> {
        self.finished = true;
        self.pending = None;
        self.stack.clear();
        Some(Err(error))
    }
}

impl Iterator for DualWalker {
    type Item = Result<Visit, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if let Some(root) = self.root.take() {
            return Some(Ok(self.emit(root)));
        }

        if let Err(error) = self.descend_pending() {
            return self.fail(error);
        }

        let Some(frame) = self.stack.last_mut() else {
            self.finished = true;
            return None;
        };

        let peer_is_dir = frame.node.secondary_kind() == Some(FileKind::Directory);
        match frame.listing.next_child() {
            Some((primary_path, relative_path, depth)) => {
                match self.prepare_node(primary_path, relative_path, depth, peer_is_dir) {
                    Ok(node) => Some(Ok(self.emit(node))),
                    Err(error) => self.fail(error),
                }
            }
            None => {
                let frame = self.stack.pop()?;
                Some(Ok(Visit::LeaveDirectory(frame.node)))
            }
        }
    }
}
