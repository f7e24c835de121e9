//! Validated layer directories and operation settings.

use std::fs::{self, DirBuilder};
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use metadata::{MarkerInspector, XattrNamespace};

use crate::plan::{LayerRoots, Root};
use crate::report::ReportStyle;

/// Errors detected while validating an [`OverlayConfigBuilder`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No lower directory was given.
    #[error("lowerdir is required")]
    MissingLower,
    /// No upper directory was given.
    #[error("upperdir is required")]
    MissingUpper,
    /// The operation needs the mounted overlay but none was given.
    #[error("mountdir is required")]
    MissingMount,
    /// A directory argument names something else.
    #[error("{role} '{}' is not a directory", .path.display())]
    NotADirectory {
        /// Which directory argument.
        role: &'static str,
        /// Offending path.
        path: PathBuf,
    },
    /// A new layer directory could not be created.
    #[error("failed to create {role} '{}': {source}", .path.display())]
    CreateDirectory {
        /// Which directory argument.
        role: &'static str,
        /// Directory being created.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A directory could not be resolved to an absolute path.
    #[error("failed to resolve {role} '{}': {source}", .path.display())]
    Canonicalize {
        /// Which directory argument.
        role: &'static str,
        /// Path as given.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Validated configuration shared by every operation.
#[derive(Clone, Debug)]
pub struct OverlayConfig {
    lower: PathBuf,
    upper: PathBuf,
    roots: LayerRoots,
    namespace: XattrNamespace,
    style: ReportStyle,
}

impl OverlayConfig {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> OverlayConfigBuilder {
        OverlayConfigBuilder::default()
    }

    /// Canonical directories bound to each root.
    #[must_use]
    pub const fn roots(&self) -> &LayerRoots {
        &self.roots
    }

    /// Canonical lower directory.
    #[must_use]
    pub fn lower(&self) -> &Path {
        &self.lower
    }

    /// Canonical upper directory.
    #[must_use]
    pub fn upper(&self) -> &Path {
        &self.upper
    }

    /// Canonical mount directory, when configured.
    #[must_use]
    pub fn mount(&self) -> Option<&Path> {
        self.roots.get(Root::Mount)
    }

    /// Canonical new lower directory, when configured.
    #[must_use]
    pub fn lower_new(&self) -> Option<&Path> {
        self.roots.get(Root::LowerNew)
    }

    /// Canonical new upper directory, when configured.
    #[must_use]
    pub fn upper_new(&self) -> Option<&Path> {
        self.roots.get(Root::UpperNew)
    }

    /// Attribute namespace of the overlay markers.
    #[must_use]
    pub const fn namespace(&self) -> XattrNamespace {
        self.namespace
    }

    /// Marker inspector for [`namespace`](Self::namespace).
    #[must_use]
    pub const fn inspector(&self) -> MarkerInspector {
        MarkerInspector::new(self.namespace)
    }

    /// Report style used by `diff`.
    #[must_use]
    pub const fn style(&self) -> ReportStyle {
        self.style
    }
}

/// Builder for [`OverlayConfig`].
#[derive(Clone, Debug, Default)]
pub struct OverlayConfigBuilder {
    lower: Option<PathBuf>,
    upper: Option<PathBuf>,
    mount: Option<PathBuf>,
    lower_new: Option<PathBuf>,
    upper_new: Option<PathBuf>,
    namespace: XattrNamespace,
    style: ReportStyle,
    require_mount: bool,
}

impl OverlayConfigBuilder {
    /// Sets the lower directory.
    #[must_use]
    #[doc(alias = "--lowerdir")]
    pub fn lower(mut self, path: impl Into<PathBuf>) -> Self {
        self.lower = Some(path.into());
        self
    }

    /// Sets the upper directory.
    #[must_use]
    #[doc(alias = "--upperdir")]
    pub fn upper(mut self, path: impl Into<PathBuf>) -> Self {
        self.upper = Some(path.into());
        self
    }

    /// Sets the mounted overlay directory.
    #[must_use]
    #[doc(alias = "--mountdir")]
    pub fn mount(mut self, path: Option<PathBuf>) -> Self {
        self.mount = path;
        self
    }

    /// Sets the new lower directory, created by [`build`](Self::build) if
    /// missing.
    #[must_use]
    #[doc(alias = "--lowernew")]
    pub fn lower_new(mut self, path: Option<PathBuf>) -> Self {
        self.lower_new = path;
        self
    }

    /// Sets the new upper directory, created by [`build`](Self::build) if
    /// missing.
    #[must_use]
    #[doc(alias = "--uppernew")]
    pub fn upper_new(mut self, path: Option<PathBuf>) -> Self {
        self.upper_new = path;
        self
    }

    /// Selects the marker namespace.
    #[must_use]
    #[doc(alias = "--userxattr")]
    pub const fn namespace(mut self, namespace: XattrNamespace) -> Self {
        self.namespace = namespace;
        self
    }

    /// Selects the diff report style.
    #[must_use]
    pub const fn style(mut self, style: ReportStyle) -> Self {
        self.style = style;
        self
    }

    /// Makes the mount directory mandatory.
    #[must_use]
    pub const fn require_mount(mut self, require: bool) -> Self {
        self.require_mount = require;
        self
    }

    /// Validates the directories and resolves them to canonical paths.
    ///
    /// # Errors
    ///
    /// Fails when a required directory is missing, when a given path is not
    /// a directory, or when a new layer directory cannot be created.
    pub fn build(self) -> Result<OverlayConfig, ConfigError> {
        let lower = self.lower.ok_or(ConfigError::MissingLower)?;
        let upper = self.upper.ok_or(ConfigError::MissingUpper)?;
        if self.require_mount && self.mount.is_none() {
            return Err(ConfigError::MissingMount);
        }

        let lower = existing_directory("lower", &lower)?;
        let upper = existing_directory("upper", &upper)?;
        let mut roots = LayerRoots::new(&lower, &upper);
        if let Some(mount) = &self.mount {
            roots = roots.bind(Root::Mount, existing_directory("mount", mount)?);
        }
        if let Some(lower_new) = &self.lower_new {
            roots = roots.bind(Root::LowerNew, created_directory("new lower", lower_new)?);
        }
        if let Some(upper_new) = &self.upper_new {
            roots = roots.bind(Root::UpperNew, created_directory("new upper", upper_new)?);
        }

        Ok(OverlayConfig {
            lower,
            upper,
            roots,
            namespace: self.namespace,
            style: self.style,
        })
    }
}

fn existing_directory(role: &'static str, path: &Path) -> Result<PathBuf, ConfigError> {
    let not_a_directory = || ConfigError::NotADirectory {
        role,
        path: path.to_path_buf(),
    };
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => canonical(role, path),
        _ => Err(not_a_directory()),
    }
}

fn created_directory(role: &'static str, path: &Path) -> Result<PathBuf, ConfigError> {
    match DirBuilder::new().mode(0o755).create(path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {}
        Err(source) => {
            return Err(ConfigError::CreateDirectory {
                role,
                path: path.to_path_buf(),
                source,
            });
        }
    }
    existing_directory(role, path)
}

fn canonical(role: &'static str, path: &Path) -> Result<PathBuf, ConfigError> {
    fs::canonicalize(path).map_err(|source| ConfigError::Canonicalize {
        role,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lower_and_upper_are_required() {
        let dir = tempdir().expect("tempdir");
        let missing_lower = OverlayConfig::builder().upper(dir.path()).build();
        assert!(matches!(missing_lower, Err(ConfigError::MissingLower)));

        let missing_upper = OverlayConfig::builder().lower(dir.path()).build();
        assert!(matches!(missing_upper, Err(ConfigError::MissingUpper)));
    }

    #[test]
    fn non_directories_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("file");
        fs::write(&file, b"").expect("write");

        let error = OverlayConfig::builder()
            .lower(&file)
            .upper(dir.path())
            .build()
            .expect_err("file is not a directory");
        assert!(matches!(error, ConfigError::NotADirectory { role: "lower", .. }));

        let error = OverlayConfig::builder()
            .lower(dir.path())
            .upper(dir.path().join("missing"))
            .build()
            .expect_err("missing upper");
        assert!(matches!(error, ConfigError::NotADirectory { role: "upper", .. }));
    }

    #[test]
    fn mount_can_be_required() {
        let dir = tempdir().expect("tempdir");
        let error = OverlayConfig::builder()
            .lower(dir.path())
            .upper(dir.path())
            .require_mount(true)
            .build()
            .expect_err("mount missing");
        assert!(matches!(error, ConfigError::MissingMount));
    }

    #[test]
    fn new_directories_are_created_and_paths_canonicalised() {
        let dir = tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("lower")).expect("mkdir");
        fs::create_dir(dir.path().join("upper")).expect("mkdir");
        fs::create_dir(dir.path().join("existing")).expect("mkdir");

        let config = OverlayConfig::builder()
            .lower(dir.path().join("upper/../lower"))
            .upper(dir.path().join("upper"))
            .lower_new(Some(dir.path().join("existing")))
            .upper_new(Some(dir.path().join("fresh")))
            .namespace(XattrNamespace::User)
            .style(ReportStyle::Brief)
            .build()
            .expect("valid config");

        let base = fs::canonicalize(dir.path()).expect("canonical");
        assert_eq!(config.lower(), base.join("lower"));
        assert_eq!(config.upper(), base.join("upper"));
        assert_eq!(config.lower_new(), Some(base.join("existing").as_path()));
        assert_eq!(config.upper_new(), Some(base.join("fresh").as_path()));
        assert!(base.join("fresh").is_dir());
        assert_eq!(config.mount(), None);
        assert_eq!(config.namespace(), XattrNamespace::User);
        assert_eq!(config.style(), ReportStyle::Brief);
    }
}
