use std::io;
use std::path::{Path, PathBuf};

/// Failure while reading metadata or extended attributes of a node.
#[derive(Debug, thiserror::Error)]
#[error("failed to {context} '{}': {source}", .path.display())]
pub struct MetadataError {
    context: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl MetadataError {
    /// Creates an error describing `context` on `path`.
    pub fn new(context: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            context,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Action that failed, e.g. `"read overlay attribute"`.
    #[must_use]
    pub const fn context(&self) -> &'static str {
        self.context
    }

    /// Path the failing action was applied to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Underlying operating system error.
    #[must_use]
    pub const fn io_error(&self) -> &io::Error {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn display_names_context_and_path() {
        let error = MetadataError::new(
            "read overlay attribute",
            Path::new("/upper/dir"),
            io::Error::other("boom"),
        );
        assert_eq!(
            error.to_string(),
            "failed to read overlay attribute '/upper/dir': boom"
        );
        assert_eq!(error.path(), Path::new("/upper/dir"));
        assert_eq!(error.context(), "read overlay attribute");
    }

    #[test]
    fn source_exposes_io_error() {
        let error = MetadataError::new(
            "stat",
            Path::new("x"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        let source = error
            .source()
            .and_then(|err| err.downcast_ref::<io::Error>())
            .expect("metadata error should expose the io::Error");
        assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
    }
}
