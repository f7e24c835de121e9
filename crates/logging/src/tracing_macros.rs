//! crates/logging/src/tracing_macros.rs
//! Convenience macros that pin the tracing target for each subsystem.
//!
//! The level is chosen by the call site through the first token:
//! `trace_walk!(debug, "entering {}", path)`.

/// Emit a traversal event on `ovl::walk`.
///
/// # Example
/// ```ignore
/// trace_walk!(trace, "visiting {}", path.display());
/// ```
#[macro_export]
macro_rules! trace_walk {
    ($level:ident, $($arg:tt)*) => {
        $crate::tracing::$level!(target: "ovl::walk", $($arg)*)
    };
}

/// Emit a marker inspection event on `ovl::marker`.
///
/// # Example
/// ```ignore
/// trace_marker!(debug, "{} is opaque", path.display());
/// ```
#[macro_export]
macro_rules! trace_marker {
    ($level:ident, $($arg:tt)*) => {
        $crate::tracing::$level!(target: "ovl::marker", $($arg)*)
    };
}

/// Emit a content comparison event on `ovl::compare`.
///
/// # Example
/// ```ignore
/// trace_compare!(trace, "chunk size {}", size);
/// ```
#[macro_export]
macro_rules! trace_compare {
    ($level:ident, $($arg:tt)*) => {
        $crate::tracing::$level!(target: "ovl::compare", $($arg)*)
    };
}

/// Emit a planned-action event on `ovl::plan`.
///
/// # Example
/// ```ignore
/// trace_plan!(info, "planned {}", action);
/// ```
#[macro_export]
macro_rules! trace_plan {
    ($level:ident, $($arg:tt)*) => {
        $crate::tracing::$level!(target: "ovl::plan", $($arg)*)
    };
}

/// Emit a diff classification event on `ovl::report`.
///
/// # Example
/// ```ignore
/// trace_report!(debug, "modified {}", rel.display());
/// ```
#[macro_export]
macro_rules! trace_report {
    ($level:ident, $($arg:tt)*) => {
        $crate::tracing::$level!(target: "ovl::report", $($arg)*)
    };
}

/// Emit a mount or root validation event on `ovl::mount`.
///
/// # Example
/// ```ignore
/// trace_mount!(warn, "overlay still mounted at {}", target);
/// ```
#[macro_export]
macro_rules! trace_mount {
    ($level:ident, $($arg:tt)*) => {
        $crate::tracing::$level!(target: "ovl::mount", $($arg)*)
    };
}
