#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` implements the four overlay layer operations on top of the
//! [`walk`] traversals and the [`metadata`] marker inspector:
//!
//! - [`diff()`] reports how the upper layer changes the lower layer.
//! - [`vacuum()`] plans the removal of upper copies that add nothing.
//! - [`merge()`] plans folding the upper layer into the lower layer.
//! - [`deref()`] plans replacing redirect and metacopy shortcuts with full
//!   copies taken from the mounted overlay.
//!
//! # Design
//!
//! Every operation is a [`walk::Visitor`] driven over a dual walk of the
//! upper layer against a peer tree. `diff` streams lines into a
//! [`DiffReport`]. The other operations append [`Action`]s to a [`Plan`],
//! which the caller hands to an [`ActionSink`]: either a
//! [`ShellScriptRenderer`] producing a reviewable script or an [`Executor`]
//! applying the actions directly.
//!
//! # Invariants
//!
//! - Actions are planned in visitation order and must be applied in that
//!   order.
//! - A failed operation returns an error and no plan, so nothing is ever
//!   rendered or executed for a partial walk.
//!
//! # Examples
//!
//! ```
//! use engine::{OverlayConfig, ShellScriptRenderer, vacuum};
//! use std::fs;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! for layer in ["lower", "upper"] {
//!     fs::create_dir(temp.path().join(layer))?;
//!     fs::write(temp.path().join(layer).join("same"), b"data")?;
//! }
//! let config = OverlayConfig::builder()
//!     .lower(temp.path().join("lower"))
//!     .upper(temp.path().join("upper"))
//!     .build()?;
//!
//! let plan = vacuum(config.lower(), config.upper(), &config.inspector())?;
//! let mut script = ShellScriptRenderer::new(Vec::new(), config.roots().clone());
//! plan.deliver(&mut script)?;
//! let script = String::from_utf8(script.into_inner())?;
//! assert!(script.ends_with("rm -f -- \"$UPPERDIR\"/'same'\n"));
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod compare;
mod config;
mod deleted;
mod deref;
mod diff;
mod error;
mod merge;
pub mod plan;
pub mod render;
mod report;
mod vacuum;

pub use compare::{regular_files_identical, symlinks_identical};
pub use config::{ConfigError, OverlayConfig, OverlayConfigBuilder};
pub use deleted::{DeletedMode, DeletedSubtreeReporter};
pub use deref::{DerefTarget, deref};
pub use diff::diff;
pub use error::{EngineError, EngineResult};
pub use merge::merge;
pub use plan::{Action, ActionSink, LayerRoots, Plan, Root, TaggedPath};
pub use render::{Executor, ShellScriptRenderer};
pub use report::{DiffReport, ReportStyle};
pub use vacuum::vacuum;
