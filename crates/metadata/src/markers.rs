//! crates/metadata/src/markers.rs
//! Overlay marker inspection.
//!
//! The overlay driver records layer state in extended attributes on upper
//! nodes. Only presence matters for `redirect` and `metacopy`; `opaque` is
//! set only when its value is exactly `y`.

use crate::error::MetadataError;
use crate::xattr::read_attribute;
use std::ffi::OsString;
use std::path::Path;

const OPAQUE: &str = "opaque";
const REDIRECT: &str = "redirect";
const METACOPY: &str = "metacopy";
const OPAQUE_VALUE: &[u8] = b"y";

/// Namespace the overlay attributes live in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum XattrNamespace {
    /// `trusted.overlay.*`, the default for privileged mounts.
    #[default]
    Trusted,
    /// `user.overlay.*`, used by mounts created with the `userxattr` option.
    User,
}

impl XattrNamespace {
    /// Attribute prefix including the trailing dot.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Trusted => "trusted.overlay.",
            Self::User => "user.overlay.",
        }
    }

    /// Full attribute name for `suffix`.
    #[must_use]
    pub fn attribute(self, suffix: &str) -> OsString {
        let mut name = OsString::from(self.prefix());
        name.push(suffix);
        name
    }
}

/// All three markers of one node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlayMarkers {
    /// `opaque` is present with value `y`.
    pub opaque: bool,
    /// `redirect` is present.
    pub redirect: bool,
    /// `metacopy` is present.
    pub metacopy: bool,
}

impl OverlayMarkers {
    /// Returns `true` when the node is not a plain overlay of its lower peer.
    #[must_use]
    pub const fn hides_lower(&self) -> bool {
        self.opaque || self.redirect
    }
}

/// Reads overlay markers from upper-layer nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkerInspector {
    namespace: XattrNamespace,
}

impl MarkerInspector {
    /// Creates an inspector reading attributes in `namespace`.
    #[must_use]
    pub const fn new(namespace: XattrNamespace) -> Self {
        Self { namespace }
    }

    /// Namespace this inspector reads.
    #[must_use]
    pub const fn namespace(&self) -> XattrNamespace {
        self.namespace
    }

    /// Returns `true` when `path` carries `opaque` with value `y`.
    pub fn is_opaque(&self, path: &Path) -> Result<bool, MetadataError> {
        let value = read_attribute(path, &self.namespace.attribute(OPAQUE))?;
        let opaque = value.as_deref() == Some(OPAQUE_VALUE);
        logging::trace_marker!(trace, path = %path.display(), opaque, "opaque marker");
        Ok(opaque)
    }

    /// Returns `true` when `path` carries a `redirect` attribute.
    pub fn is_redirect(&self, path: &Path) -> Result<bool, MetadataError> {
        let redirect = read_attribute(path, &self.namespace.attribute(REDIRECT))?.is_some();
        logging::trace_marker!(trace, path = %path.display(), redirect, "redirect marker");
        Ok(redirect)
    }

    /// Returns `true` when `path` carries a `metacopy` attribute.
    pub fn is_metacopy(&self, path: &Path) -> Result<bool, MetadataError> {
        let metacopy = read_attribute(path, &self.namespace.attribute(METACOPY))?.is_some();
        logging::trace_marker!(trace, path = %path.display(), metacopy, "metacopy marker");
        Ok(metacopy)
    }

    /// Returns `true` when `path` hides the lower directory at the same path.
    ///
    /// Redirected directories count as opaque because redirects are never
    /// followed.
    pub fn is_opaque_directory(&self, path: &Path) -> Result<bool, MetadataError> {
        Ok(self.is_opaque(path)? || self.is_redirect(path)?)
    }

    /// Reads all three markers of `path`.
    pub fn markers(&self, path: &Path) -> Result<OverlayMarkers, MetadataError> {
        let markers = OverlayMarkers {
            opaque: self.is_opaque(path)?,
            redirect: self.is_redirect(path)?,
            metacopy: self.is_metacopy(path)?,
        };
        logging::trace_marker!(debug, path = %path.display(), ?markers, "overlay markers");
        Ok(markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::fs;
    use tempfile::tempdir;

    fn xattrs_supported(path: &Path) -> bool {
        let test_name = OsStr::new("user.test_support");
        match xattr::set(path, test_name, b"test") {
            Ok(()) => {
                let _ = xattr::remove(path, test_name);
                true
            }
            Err(_) => false,
        }
    }

    #[test]
    fn namespace_builds_attribute_names() {
        assert_eq!(
            XattrNamespace::Trusted.attribute("opaque"),
            OsString::from("trusted.overlay.opaque")
        );
        assert_eq!(
            XattrNamespace::User.attribute("metacopy"),
            OsString::from("user.overlay.metacopy")
        );
        assert_eq!(XattrNamespace::default(), XattrNamespace::Trusted);
    }

    #[test]
    fn unmarked_node_has_no_markers() {
        let dir = tempdir().expect("tempdir");
        let inspector = MarkerInspector::new(XattrNamespace::User);
        let markers = inspector.markers(dir.path()).expect("markers");
        assert_eq!(markers, OverlayMarkers::default());
        assert!(!markers.hides_lower());
    }

    #[test]
    fn opaque_requires_value_y() {
        let dir = tempdir().expect("tempdir");
        let yes = dir.path().join("yes");
        let other = dir.path().join("other");
        fs::create_dir(&yes).expect("mkdir");
        fs::create_dir(&other).expect("mkdir");
        if !xattrs_supported(&yes) {
            eprintln!("xattrs not supported, skipping test");
            return;
        }

        xattr::set(&yes, "user.overlay.opaque", b"y").expect("set");
        xattr::set(&other, "user.overlay.opaque", b"x").expect("set");

        let inspector = MarkerInspector::new(XattrNamespace::User);
        assert!(inspector.is_opaque(&yes).expect("opaque"));
        assert!(!inspector.is_opaque(&other).expect("opaque"));
    }

    #[test]
    fn redirect_and_metacopy_only_need_presence() {
        let dir = tempdir().expect("tempdir");
        let file = dir.path().join("file");
        fs::write(&file, b"").expect("write");
        if !xattrs_supported(&file) {
            eprintln!("xattrs not supported, skipping test");
            return;
        }

        xattr::set(&file, "user.overlay.redirect", b"").expect("set");
        xattr::set(&file, "user.overlay.metacopy", b"").expect("set");

        let inspector = MarkerInspector::new(XattrNamespace::User);
        let markers = inspector.markers(&file).expect("markers");
        assert!(markers.redirect);
        assert!(markers.metacopy);
        assert!(!markers.opaque);
        assert!(markers.hides_lower());
    }

    #[test]
    fn inspector_ignores_other_namespace() {
        let dir = tempdir().expect("tempdir");
        if !xattrs_supported(dir.path()) {
            eprintln!("xattrs not supported, skipping test");
            return;
        }
        xattr::set(dir.path(), "user.overlay.opaque", b"y").expect("set");

        let trusted = MarkerInspector::new(XattrNamespace::Trusted);
        assert!(!trusted.is_opaque(dir.path()).expect("opaque"));
    }

    #[test]
    fn redirect_counts_as_opaque_directory() {
        let dir = tempdir().expect("tempdir");
        let redirected = dir.path().join("redirected");
        let plain = dir.path().join("plain");
        fs::create_dir(&redirected).expect("mkdir");
        fs::create_dir(&plain).expect("mkdir");
        if !xattrs_supported(&redirected) {
            eprintln!("xattrs not supported, skipping test");
            return;
        }
        xattr::set(&redirected, "user.overlay.redirect", b"/old").expect("set");

        let inspector = MarkerInspector::new(XattrNamespace::User);
        assert!(inspector.is_opaque_directory(&redirected).expect("opaque"));
        assert!(!inspector.is_opaque(&redirected).expect("opaque"));
        assert!(!inspector.is_opaque_directory(&plain).expect("opaque"));
    }
}
