#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` centralises diagnostics for the `ovl-tools` workspace. Every
//! subsystem logs through the [`tracing`] facade using a fixed set of targets
//! (`ovl::walk`, `ovl::marker`, `ovl::compare`, `ovl::plan`, `ovl::report`,
//! `ovl::mount`), one per [`LogFlag`]. The convenience macros exported here
//! (`trace_walk!`, `trace_plan!`, ...) pin the target so call sites stay short.
//!
//! # Design
//!
//! - [`LogFlag`] and [`LogLevels`] describe which subsystem is allowed to log
//!   and how chatty it may be.
//! - [`VerbosityConfig`] maps the command line's `--debug` count onto
//!   per-flag levels.
//! - [`init_tracing`] installs a `tracing-subscriber` registry that writes to
//!   standard error, filtered by the configuration (or by `RUST_LOG` when it
//!   is set).
//!
//! # Invariants
//!
//! - Diagnostics never go to standard output. The diff report owns stdout and
//!   the two streams must stay separable.
//! - Warnings and errors are always emitted, regardless of the configured
//!   levels.
//!
//! # Examples
//!
//! ```
//! use logging::{LogFlag, VerbosityConfig};
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! assert_eq!(config.level(LogFlag::Walk), 2);
//! assert_eq!(LogFlag::Walk.target(), "ovl::walk");
//! ```

mod config;
mod levels;
mod tracing_bridge;
mod tracing_macros;

pub use config::VerbosityConfig;
pub use levels::{LogFlag, LogLevels};
pub use tracing_bridge::{init_tracing, targets_filter};

#[doc(hidden)]
pub use tracing;
