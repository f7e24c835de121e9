//! Check that the upper layer accepts overlay attributes.

use std::path::Path;

use metadata::XattrNamespace;

use crate::error::CliError;

const PROBE_SUFFIX: &str = "test";
const PROBE_VALUE: &[u8] = b"naive";

/// Writes and reads back a `<namespace>test` attribute on a scratch file in
/// `upper`.
///
/// Writing `trusted.*` attributes needs `CAP_SYS_ADMIN`.
pub(crate) fn probe_xattr(upper: &Path, namespace: XattrNamespace) -> Result<(), CliError> {
    let failed = || CliError::XattrProbe {
        prefix: namespace.prefix(),
        path: upper.to_path_buf(),
    };
    let scratch = tempfile::Builder::new()
        .prefix(".xattr_test_")
        .suffix(".tmp")
        .tempfile_in(upper)
        .map_err(|_| failed())?;

    let name = namespace.attribute(PROBE_SUFFIX);
    let verified = xattr::set(scratch.path(), &name, PROBE_VALUE).is_ok()
        && matches!(
            xattr::get(scratch.path(), &name),
            Ok(Some(value)) if value == PROBE_VALUE
        );
    logging::trace_mount!(debug, path = %upper.display(), verified, "xattr probe");
    if verified { Ok(()) } else { Err(failed()) }
}
