#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` provides the deterministic traversals used to analyse overlay
//! layers. [`DualWalker`] enumerates one tree (usually the upper layer) and,
//! for every node, observes the node at the same relative path in a peer
//! tree (the lower layer or the mounted view). [`Walker`] is the one-sided
//! variant used to enumerate subtrees that exist in only one layer.
//!
//! # Design
//!
//! - [`DualWalkBuilder`] and [`WalkBuilder`] own the roots and build the
//!   walkers. Both walkers implement [`Iterator`]; directory entries are
//!   sorted before they are yielded, so output is stable across filesystems.
//! - [`DualWalker`] yields typed [`Visit`] events carrying a
//!   [`NodeObservation`]. Directories produce an enter event before their
//!   children and a leave event after them.
//! - [`Visitor`] is the handler capability set: five methods with no-op
//!   defaults. [`drive`] runs a walker to completion against a visitor and
//!   honours [`Flow::SkipSubtree`] from directory enter handlers.
//!
//! # Invariants
//!
//! - Symlinks are never followed, neither in the walked tree nor when
//!   stat'ing peers.
//! - Each node of the walked tree is yielded exactly once, the root included.
//! - A peer that is missing, or whose ancestor is not a directory, is
//!   reported as absent. Any other peer stat failure aborts the walk.
//! - FIFOs, sockets, block devices and character devices other than
//!   whiteouts abort a dual walk with [`WalkErrorKind::UnsupportedNode`].
//!
//! # Errors
//!
//! Traversal emits [`WalkError`] when metadata cannot be queried or a
//! directory cannot be read. The walker yields at most one error and then
//! stops.
//!
//! # Examples
//!
//! ```
//! use walk::{DualWalkBuilder, Visit};
//! use std::fs;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let upper = temp.path().join("upper");
//! let lower = temp.path().join("lower");
//! fs::create_dir_all(upper.join("dir"))?;
//! fs::create_dir(&lower)?;
//! fs::write(upper.join("dir/file"), b"data")?;
//!
//! let mut added = Vec::new();
//! for visit in DualWalkBuilder::new(&upper, &lower).build()? {
//!     if let Visit::File(node) = visit? {
//!         if node.secondary().is_none() {
//!             added.push(node.relative_path().to_path_buf());
//!         }
//!     }
//! }
//! assert_eq!(added, [std::path::PathBuf::from("dir/file")]);
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod builder;
mod dual;
mod entry;
mod error;
mod visitor;
mod walker;

pub use builder::{DualWalkBuilder, WalkBuilder};
pub use dual::{DualWalker, Visit};
pub use entry::{NodeObservation, WalkEntry};
pub use error::{WalkError, WalkErrorKind};
pub use visitor::{Flow, Visitor, drive};
pub use walker::Walker;

#[cfg(test)]
mod tests;
