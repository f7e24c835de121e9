use crate::error::MetadataError;
use std::ffi::OsStr;
use std::io;
use std::path::Path;

/// Returns `true` when `error` means the filesystem has no xattr support.
pub(crate) fn is_unsupported(error: &io::Error) -> bool {
    matches!(
        error.raw_os_error(),
        Some(code) if code == libc::ENOTSUP || code == libc::EOPNOTSUPP
    )
}

/// Reads `name` from `path` without following a trailing symlink.
///
/// A missing attribute and a filesystem without xattr support both yield
/// `Ok(None)`.
pub(crate) fn read_attribute(
    path: &Path,
    name: &OsStr,
) -> Result<Option<Vec<u8>>, MetadataError> {
    match xattr::get(path, name) {
        Ok(value) => Ok(value),
        Err(error) if is_unsupported(&error) => Ok(None),
        Err(error) => Err(MetadataError::new("read overlay attribute", path, error)),
    }
}

/// Copies every extended attribute of `source` onto `destination`.
///
/// Neither path is dereferenced. Attributes the caller is not privileged to
/// set, such as `trusted.*` for an unprivileged user, are skipped, as are
/// filesystems without xattr support on either side.
pub fn copy_xattrs(source: &Path, destination: &Path) -> Result<(), MetadataError> {
    let names = match xattr::list(source) {
        Ok(names) => names,
        Err(error) if is_unsupported(&error) => return Ok(()),
        Err(error) => {
            return Err(MetadataError::new(
                "list extended attributes",
                source,
                error,
            ));
        }
    };

    for name in names {
        let Some(value) = xattr::get(source, &name)
            .map_err(|error| MetadataError::new("read extended attribute", source, error))?
        else {
            continue;
        };

        match xattr::set(destination, &name, &value) {
            Ok(()) => {}
            Err(error)
                if is_unsupported(&error) || error.kind() == io::ErrorKind::PermissionDenied =>
            {
                logging::trace_marker!(
                    debug,
                    attribute = %name.to_string_lossy(),
                    path = %destination.display(),
                    "skipping extended attribute: {error}"
                );
            }
            Err(error) => {
                return Err(MetadataError::new(
                    "write extended attribute",
                    destination,
                    error,
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn read_missing_attribute_returns_none() {
        let dir = tempdir().expect("create temp dir");
        let file = dir.path().join("file");
        fs::write(&file, b"content").expect("write file");

        let value = read_attribute(&file, OsStr::new("user.overlay.opaque")).expect("read");
        assert!(value.is_none());
    }

    #[test]
    fn read_attribute_on_missing_path_is_an_error() {
        let dir = tempdir().expect("create temp dir");
        let error = read_attribute(&dir.path().join("missing"), OsStr::new("user.x"))
            .expect_err("missing path should fail");
        assert_eq!(error.io_error().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn copy_xattrs_replicates_user_attributes() {
        let dir = tempdir().expect("create temp dir");
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::write(&source, b"a").expect("write source");
        fs::write(&destination, b"b").expect("write destination");

        if !xattrs_supported(&source) {
            eprintln!("xattrs not supported, skipping test");
            return;
        }

        xattr::set(&source, "user.overlay.opaque", b"y").expect("set opaque");
        xattr::set(&source, "user.comment", b"kept").expect("set comment");

        copy_xattrs(&source, &destination).expect("copy xattrs");

        assert_eq!(
            xattr::get(&destination, "user.overlay.opaque").expect("get"),
            Some(b"y".to_vec())
        );
        assert_eq!(
            xattr::get(&destination, "user.comment").expect("get"),
            Some(b"kept".to_vec())
        );
    }

    #[test]
    fn copy_xattrs_without_attributes_is_a_no_op() {
        let dir = tempdir().expect("create temp dir");
        let source = dir.path().join("source");
        let destination = dir.path().join("destination");
        fs::write(&source, b"a").expect("write source");
        fs::write(&destination, b"b").expect("write destination");

        copy_xattrs(&source, &destination).expect("copy xattrs");
    }
}
