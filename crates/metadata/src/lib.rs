#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `metadata` answers per-node questions about the two layers of an overlay
//! filesystem: what kind of node a path is, whether two nodes carry the same
//! permission identity, and which overlay markers an upper node carries.
//!
//! # Design
//!
//! - [`NodeStat`] is a compact, copyable snapshot of the `lstat` fields the
//!   reconciliation algorithms need (kind, size, preferred block size, owner,
//!   group and mode). [`FileKind`] classifies nodes, including the overlay
//!   whiteout convention (a character device with device number `0`).
//! - [`MarkerInspector`] reads the `opaque`, `redirect` and `metacopy`
//!   extended attributes in a configurable [`XattrNamespace`]. Markers are
//!   read on demand and never cached.
//! - [`copy_xattrs`] replicates every extended attribute of one node onto
//!   another and is used when plans are executed directly.
//!
//! # Errors
//!
//! All fallible operations return [`MetadataError`], which records the failed
//! action and the offending path alongside the underlying [`std::io::Error`].
//! A missing attribute is never an error.

mod error;
mod markers;
mod stat;
mod xattr;

pub use error::MetadataError;
pub use markers::{MarkerInspector, OverlayMarkers, XattrNamespace};
pub use stat::{FileKind, NodeStat, permission_bits, permissions_identical, stat_if_exists};
pub use xattr::copy_xattrs;
