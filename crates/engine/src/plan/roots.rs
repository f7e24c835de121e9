use std::path::{Path, PathBuf};

use super::action::{Root, TaggedPath};
use crate::error::{EngineError, EngineResult};

/// Absolute directories bound to each [`Root`] tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerRoots {
    lower: Option<PathBuf>,
    upper: Option<PathBuf>,
    mount: Option<PathBuf>,
    lower_new: Option<PathBuf>,
    upper_new: Option<PathBuf>,
}

impl LayerRoots {
    /// Binds the two mandatory layers.
    pub fn new(lower: impl Into<PathBuf>, upper: impl Into<PathBuf>) -> Self {
        Self {
            lower: Some(lower.into()),
            upper: Some(upper.into()),
            ..Self::default()
        }
    }

    /// Binds `root` to `path`, replacing any previous binding.
    pub fn bind(mut self, root: Root, path: impl Into<PathBuf>) -> Self {
        *self.slot(root) = Some(path.into());
        self
    }

    fn slot(&mut self, root: Root) -> &mut Option<PathBuf> {
        match root {
            Root::Lower => &mut self.lower,
            Root::Upper => &mut self.upper,
            Root::Mount => &mut self.mount,
            Root::LowerNew => &mut self.lower_new,
            Root::UpperNew => &mut self.upper_new,
        }
    }

    /// Directory bound to `root`, if any.
    #[must_use]
    pub fn get(&self, root: Root) -> Option<&Path> {
        match root {
            Root::Lower => self.lower.as_deref(),
            Root::Upper => self.upper.as_deref(),
            Root::Mount => self.mount.as_deref(),
            Root::LowerNew => self.lower_new.as_deref(),
            Root::UpperNew => self.upper_new.as_deref(),
        }
    }

    /// Bound roots in declaration order.
    pub fn bound(&self) -> impl Iterator<Item = (Root, &Path)> {
        Root::ALL
            .into_iter()
            .filter_map(|root| self.get(root).map(|path| (root, path)))
    }

    /// Absolute path of `path`.
    ///
    /// # Errors
    ///
    /// Fails with [`EngineError::UnboundRoot`] when the root has no directory.
    pub fn resolve(&self, path: &TaggedPath) -> EngineResult<PathBuf> {
        let base = self
            .get(path.root())
            .ok_or(EngineError::UnboundRoot { root: path.root() })?;
        if path.relative().as_os_str().is_empty() {
            Ok(base.to_path_buf())
        } else {
            Ok(base.join(path.relative()))
        }
    }
}
