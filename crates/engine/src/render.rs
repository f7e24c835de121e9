//! Sinks that turn a [`Plan`](crate::plan::Plan) into effects.
//!
//! [`ShellScriptRenderer`] writes a reviewable bash script; [`Executor`]
//! applies the actions to the filesystem directly. Both resolve
//! [`TaggedPath`](crate::plan::TaggedPath) operands through the same
//! [`LayerRoots`](crate::plan::LayerRoots).

mod execute;
mod script;

pub use execute::Executor;
pub use script::{ShellScriptRenderer, shell_quote};
