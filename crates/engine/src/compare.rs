//! Content equivalence of regular files and symbolic links.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use metadata::{MarkerInspector, NodeStat};

use crate::error::{EngineError, EngineResult, IoResultExt};

const PATH_MAX: usize = libc::PATH_MAX as usize;

/// Decides whether an upper regular file adds nothing over its lower peer.
///
/// Files of different size are never identical and are rejected without
/// any I/O. An upper file marked metacopy is identical unless it is also
/// redirected. Everything else is compared byte for byte in chunks of the
/// smaller preferred block size.
///
/// # Errors
///
/// Fails when either file cannot be opened or read, when an overlay marker
/// cannot be read, or when the two files produce reads of different lengths.
pub fn regular_files_identical(
    lower_path: &Path,
    lower: &NodeStat,
    upper_path: &Path,
    upper: &NodeStat,
    inspector: &MarkerInspector,
) -> EngineResult<bool> {
    if lower.size != upper.size {
        logging::trace_compare!(trace, path = %upper_path.display(), "sizes differ");
        return Ok(false);
    }

    if inspector.is_metacopy(upper_path)? {
        let identical = !inspector.is_redirect(upper_path)?;
        logging::trace_compare!(
            trace,
            path = %upper_path.display(),
            identical,
            "metacopy shortcut"
        );
        return Ok(identical);
    }

    let chunk = lower.effective_blksize().min(upper.effective_blksize()) as usize;
    let identical = compare_contents(lower_path, upper_path, chunk)?;
    logging::trace_compare!(
        trace,
        path = %upper_path.display(),
        identical,
        chunk,
        "compared contents"
    );
    Ok(identical)
}

fn compare_contents(lower_path: &Path, upper_path: &Path, chunk: usize) -> EngineResult<bool> {
    let mut lower = File::open(lower_path).with_path("open file", lower_path)?;
    let mut upper = File::open(upper_path).with_path("open file", upper_path)?;
    let mut lower_buffer = vec![0u8; chunk];
    let mut upper_buffer = vec![0u8; chunk];

    loop {
        let lower_read = read_chunk(&mut lower, &mut lower_buffer).with_path("read file", lower_path)?;
        let upper_read = read_chunk(&mut upper, &mut upper_buffer).with_path("read file", upper_path)?;
        if lower_read != upper_read {
            return Err(EngineError::UnexpectedSizeChange {
                path: upper_path.to_path_buf(),
            });
        }
        if lower_buffer[..lower_read] != upper_buffer[..upper_read] {
            return Ok(false);
        }
        if lower_read == 0 {
            return Ok(true);
        }
    }
}

/// Fills `buffer` unless end of file comes first; returns the bytes read.
fn read_chunk<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(read) => filled += read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
    Ok(filled)
}

/// Decides whether two symbolic links point at exactly the same target.
///
/// Targets are compared as raw strings, so `a/b` and `a//b/` differ.
///
/// # Errors
///
/// Fails when either link cannot be read or when a target reaches
/// `PATH_MAX` bytes.
pub fn symlinks_identical(lower_path: &Path, upper_path: &Path) -> EngineResult<bool> {
    let lower = read_link_target(lower_path)?;
    let upper = read_link_target(upper_path)?;
    let identical = lower == upper;
    logging::trace_compare!(trace, path = %upper_path.display(), identical, "compared link targets");
    Ok(identical)
}

fn read_link_target(path: &Path) -> EngineResult<OsString> {
    let target = fs::read_link(path).map_err(|_| EngineError::UnresolvableSymlink {
        path: path.to_path_buf(),
    })?;
    if target.as_os_str().len() >= PATH_MAX {
        return Err(EngineError::UnresolvableSymlink {
            path: path.to_path_buf(),
        });
    }
    Ok(target.into_os_string())
}
