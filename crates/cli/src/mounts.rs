//! Detection of overlay mounts still using the layers.

use std::fs;
use std::io;
use std::path::Path;

/// Default location of the kernel mount table.
pub(crate) const PROC_MOUNTS: &str = "/proc/mounts";

/// Outcome of looking up the layers in the mount table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MountStatus {
    /// No overlay mount uses the layers.
    NotMounted,
    /// An overlay mount uses the lower or upper directory.
    Mounted,
    /// The table could not be interpreted; treated as mounted.
    Unknown(String),
}

impl MountStatus {
    /// Returns `true` unless the layers are known to be unmounted.
    pub(crate) const fn may_be_mounted(&self) -> bool {
        !matches!(self, Self::NotMounted)
    }
}

/// Reads `table` and checks whether `lower` or `upper` back an overlay mount.
pub(crate) fn check_mounted(table: &Path, lower: &Path, upper: &Path) -> MountStatus {
    match fs::read_to_string(table) {
        Ok(contents) => scan(&contents, lower, upper),
        Err(error) => unreadable(table, &error),
    }
}

fn unreadable(table: &Path, error: &io::Error) -> MountStatus {
    MountStatus::Unknown(format!(
        "cannot read {} to test whether OverlayFS is mounted: {error}",
        table.display()
    ))
}

/// Scans mount table `contents` in `/proc/mounts` format.
pub(crate) fn scan(contents: &str, lower: &Path, upper: &Path) -> MountStatus {
    let (lower, upper) = (lower.to_string_lossy(), upper.to_string_lossy());
    for line in contents.lines().filter(|line| line.starts_with("overlay")) {
        let Some(options) = line.split_whitespace().nth(3) else {
            return MountStatus::Unknown(format!("malformed mount table line: {line}"));
        };
        let mut lower_dirs = None;
        let mut upper_dir = None;
        for option in options.split(',') {
            if let Some(value) = option.strip_prefix("lowerdir=") {
                lower_dirs = Some(value);
            } else if let Some(value) = option.strip_prefix("upperdir=") {
                upper_dir = Some(value);
            }
        }
        let (Some(lower_dirs), Some(upper_dir)) = (lower_dirs, upper_dir) else {
            return MountStatus::Unknown(
                "cannot extract information from OverlayFS line in mount table".to_owned(),
            );
        };

        let lower_matches = lower_dirs
            .split(':')
            .filter(|dir| !dir.is_empty())
            .any(|dir| unescape(dir) == lower);
        if lower_matches || unescape(upper_dir) == upper {
            logging::trace_mount!(info, line, "overlay still mounted");
            return MountStatus::Mounted;
        }
    }
    MountStatus::NotMounted
}

/// Decodes the `\ooo` octal escapes the kernel uses for blanks and
/// backslashes.
fn unescape(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'\\'
            && let Some(digits) = bytes.get(index + 1..index + 4)
            && digits.iter().all(|digit| (b'0'..=b'7').contains(digit))
        {
            let value = digits
                .iter()
                .fold(0u32, |acc, digit| acc * 8 + u32::from(digit - b'0'));
            if let Ok(byte) = u8::try_from(value) {
                decoded.push(byte);
                index += 4;
                continue;
            }
        }
        decoded.push(bytes[index]);
        index += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}
