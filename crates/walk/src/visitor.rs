use crate::dual::{DualWalker, Visit};
use crate::entry::NodeObservation;
use crate::error::WalkError;

/// Decision returned when entering a directory.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
    /// Visit the children and the matching leave event.
    #[default]
    Continue,
    /// Skip the children and the matching leave event.
    SkipSubtree,
}

/// Per-kind handlers plugged into [`drive`].
///
/// Every method defaults to a no-op, so implementors only override the
/// events they care about. Returning an error aborts the walk immediately.
pub trait Visitor {
    /// Error type of the handlers. Walk failures are converted into it.
    type Error: From<WalkError>;

    /// Called before the children of a directory.
    fn on_enter_dir(&mut self, _node: &NodeObservation) -> Result<Flow, Self::Error> {
        Ok(Flow::Continue)
    }

    /// Called after the children of a directory that was not skipped.
    fn on_leave_dir(&mut self, _node: &NodeObservation) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for regular files.
    fn on_file(&mut self, _node: &NodeObservation) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for symbolic links.
    fn on_symlink(&mut self, _node: &NodeObservation) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called for whiteouts.
    fn on_whiteout(&mut self, _node: &NodeObservation) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Runs `walker` to completion, dispatching each event to `visitor`.
///
/// # Errors
///
/// Returns the first traversal failure or handler error. No further events
/// are dispatched after it.
pub fn drive<V: Visitor + ?Sized>(mut walker: DualWalker, visitor: &mut V) -> Result<(), V::Error> {
    while let Some(visit) = walker.next() {
        match visit? {
            Visit::EnterDirectory(node) => {
                if visitor.on_enter_dir(&node)? == Flow::SkipSubtree {
                    walker.skip_current_dir();
                }
            }
            Visit::LeaveDirectory(node) => visitor.on_leave_dir(&node)?,
            Visit::File(node) => visitor.on_file(&node)?,
            Visit::Symlink(node) => visitor.on_symlink(&node)?,
            Visit::Whiteout(node) => visitor.on_whiteout(&node)?,
        }
    }
    Ok(())
}
