use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt, lchown, symlink};
use std::path::Path;

use filetime::{FileTime, set_symlink_file_times};
use metadata::copy_xattrs;
use rustix::fs::{CWD, FileType, Mode, major, makedev, minor, mknodat};

use crate::error::{EngineError, EngineResult, IoResultExt};
use crate::plan::{Action, ActionSink, LayerRoots};

/// Applies actions to the filesystem as they arrive.
///
/// Removals of paths that are already gone succeed, so re-running a plan
/// that was interrupted part way is safe.
#[derive(Clone, Debug)]
pub struct Executor {
    roots: LayerRoots,
    applied: usize,
}

impl Executor {
    /// Creates an executor resolving operands against `roots`.
    #[must_use]
    pub const fn new(roots: LayerRoots) -> Self {
        Self { roots, applied: 0 }
    }

    /// Number of actions applied so far.
    #[must_use]
    pub const fn applied(&self) -> usize {
        self.applied
    }
}

impl ActionSink for Executor {
    fn apply(&mut self, action: &Action) -> EngineResult<()> {
        logging::trace_plan!(debug, "applying {action}");
        match action {
            Action::Remove(path) => {
                let path = self.roots.resolve(path)?;
                ignore_missing(fs::remove_file(&path)).with_path("remove", &path)?;
            }
            Action::RemoveTree(path) => {
                let path = self.roots.resolve(path)?;
                remove_tree(&path).with_path("remove tree", &path)?;
            }
            Action::RemoveDir(path) => {
                let path = self.roots.resolve(path)?;
                fs::remove_dir(&path).with_path("remove directory", &path)?;
            }
            Action::RemoveDirIfEmpty(path) => {
                let path = self.roots.resolve(path)?;
                match fs::remove_dir(&path) {
                    Err(error) if is_not_empty(&error) => {
                        logging::trace_plan!(trace, path = %path.display(), "directory not empty");
                    }
                    result => ignore_missing(result).with_path("remove directory", &path)?,
                }
            }
            Action::Move { from, to } => {
                let (from, to) = (self.roots.resolve(from)?, self.roots.resolve(to)?);
                fs::rename(&from, &to).with_path("move", &from)?;
            }
            Action::Copy { from, to } => {
                let (from, to) = (self.roots.resolve(from)?, self.roots.resolve(to)?);
                copy_tree(&from, &to)?;
            }
            Action::ChangePermissionsLike { reference, target } => {
                let reference = self.roots.resolve(reference)?;
                let target = self.roots.resolve(target)?;
                change_permissions_like(&reference, &target)?;
            }
        }
        self.applied += 1;
        Ok(())
    }
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn is_not_empty(error: &io::Error) -> bool {
    matches!(
        error.raw_os_error(),
        Some(code) if code == libc::ENOTEMPTY || code == libc::EEXIST
    )
}

fn remove_tree(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(error),
    }
}

fn change_permissions_like(reference: &Path, target: &Path) -> EngineResult<()> {
    let wanted = fs::symlink_metadata(reference).with_path("inspect", reference)?;
    let current = fs::symlink_metadata(target).with_path("inspect", target)?;
    if wanted.uid() != current.uid() || wanted.gid() != current.gid() {
        lchown(target, Some(wanted.uid()), Some(wanted.gid())).with_path("change owner", target)?;
    }
    fs::set_permissions(target, fs::Permissions::from_mode(wanted.mode() & 0o7777))
        .with_path("change permissions", target)
}

/// Copies `source` onto `destination` the way `cp -a -T` does.
///
/// An existing destination directory receives the source's entries.
fn copy_tree(source: &Path, destination: &Path) -> EngineResult<()> {
    let metadata = fs::symlink_metadata(source).with_path("inspect", source)?;
    let file_type = metadata.file_type();

    if file_type.is_dir() {
        match fs::create_dir(destination) {
            Err(error) if error.kind() == io::ErrorKind::AlreadyExists && destination.is_dir() => {}
            result => result.with_path("create directory", destination)?,
        }
        let mut names = fs::read_dir(source)
            .with_path("read directory", source)?
            .map(|entry| entry.map(|entry| entry.file_name()))
            .collect::<io::Result<Vec<_>>>()
            .with_path("read directory", source)?;
        names.sort();
        for name in names {
            copy_tree(&source.join(&name), &destination.join(&name))?;
        }
    } else if file_type.is_file() {
        fs::copy(source, destination).with_path("copy", source)?;
    } else if file_type.is_symlink() {
        let target = fs::read_link(source).with_path("read link", source)?;
        symlink(&target, destination).with_path("create symlink", destination)?;
    } else {
        let node_type = if file_type.is_char_device() {
            FileType::CharacterDevice
        } else if file_type.is_block_device() {
            FileType::BlockDevice
        } else if file_type.is_fifo() {
            FileType::Fifo
        } else {
            return Err(EngineError::unsupported_node(source));
        };
        let raw = metadata.rdev();
        mknodat(
            CWD,
            destination,
            node_type,
            Mode::from_raw_mode(metadata.mode() & 0o7777),
            makedev(major(raw), minor(raw)),
        )
        .map_err(io::Error::from)
        .with_path("create node", destination)?;
    }

    copy_xattrs(source, destination)?;
    copy_attributes(&metadata, destination)
}

fn copy_attributes(metadata: &fs::Metadata, destination: &Path) -> EngineResult<()> {
    match lchown(destination, Some(metadata.uid()), Some(metadata.gid())) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::PermissionDenied => {
            logging::trace_plan!(
                debug,
                path = %destination.display(),
                "ownership not preserved: {error}"
            );
        }
        Err(error) => return Err(EngineError::io("change owner", destination, error)),
    }
    if !metadata.file_type().is_symlink() {
        fs::set_permissions(destination, fs::Permissions::from_mode(metadata.mode() & 0o7777))
            .with_path("change permissions", destination)?;
    }
    set_symlink_file_times(
        destination,
        FileTime::from_last_access_time(metadata),
        FileTime::from_last_modification_time(metadata),
    )
    .with_path("set times", destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Plan, Root, TaggedPath};
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempdir().expect("tempdir");
        let lower = dir.path().join("lower");
        let upper = dir.path().join("upper");
        fs::create_dir(&lower).expect("mkdir");
        fs::create_dir(&upper).expect("mkdir");
        (dir, lower, upper)
    }

    fn run(roots: LayerRoots, actions: Vec<Action>) -> EngineResult<usize> {
        let mut executor = Executor::new(roots);
        actions.into_iter().collect::<Plan>().deliver(&mut executor)?;
        Ok(executor.applied())
    }

    #[test]
    fn removals_tolerate_missing_paths() {
        let (_dir, lower, upper) = setup();
        fs::create_dir(upper.join("full")).expect("mkdir");
        fs::write(upper.join("full/f"), b"f").expect("write");

        let applied = run(
            LayerRoots::new(&lower, &upper),
            vec![
                Action::Remove(TaggedPath::new(Root::Upper, "missing")),
                Action::RemoveTree(TaggedPath::new(Root::Lower, "missing")),
                Action::RemoveDirIfEmpty(TaggedPath::new(Root::Upper, "full")),
                Action::RemoveDirIfEmpty(TaggedPath::new(Root::Upper, "missing")),
            ],
        )
        .expect("execute");
        assert_eq!(applied, 4);
        assert!(upper.join("full/f").exists());
    }

    #[test]
    fn move_replaces_and_remove_dir_requires_empty() {
        let (_dir, lower, upper) = setup();
        fs::create_dir(upper.join("d")).expect("mkdir");
        fs::write(upper.join("d/f"), b"new").expect("write");
        fs::write(lower.join("f"), b"old").expect("write");

        run(
            LayerRoots::new(&lower, &upper),
            vec![
                Action::Move {
                    from: TaggedPath::new(Root::Upper, "d/f"),
                    to: TaggedPath::new(Root::Lower, "f"),
                },
                Action::RemoveDir(TaggedPath::new(Root::Upper, "d")),
            ],
        )
        .expect("execute");
        assert_eq!(fs::read(lower.join("f")).expect("read"), b"new");
        assert!(!upper.join("d").exists());

        fs::create_dir(upper.join("busy")).expect("mkdir");
        fs::write(upper.join("busy/x"), b"x").expect("write");
        let error = run(
            LayerRoots::new(&lower, &upper),
            vec![Action::RemoveDir(TaggedPath::new(Root::Upper, "busy"))],
        )
        .expect_err("not empty");
        assert!(matches!(error, EngineError::Io { action: "remove directory", .. }));
    }

    #[test]
    fn copy_preserves_tree_modes_and_links() {
        let (dir, lower, upper) = setup();
        let new_upper = dir.path().join("new");
        fs::create_dir(&new_upper).expect("mkdir");
        fs::create_dir(upper.join("sub")).expect("mkdir");
        fs::write(upper.join("sub/script"), b"#!/bin/sh\n").expect("write");
        fs::set_permissions(upper.join("sub/script"), fs::Permissions::from_mode(0o751))
            .expect("chmod");
        fs::set_permissions(upper.join("sub"), fs::Permissions::from_mode(0o700)).expect("chmod");
        symlink("sub/script", upper.join("link")).expect("symlink");

        run(
            LayerRoots::new(&lower, &upper).bind(Root::UpperNew, &new_upper),
            vec![Action::Copy {
                from: TaggedPath::new(Root::Upper, ""),
                to: TaggedPath::new(Root::UpperNew, ""),
            }],
        )
        .expect("execute");

        let script = fs::metadata(new_upper.join("sub/script")).expect("stat");
        assert_eq!(script.mode() & 0o7777, 0o751);
        let sub = fs::metadata(new_upper.join("sub")).expect("stat");
        assert_eq!(sub.mode() & 0o7777, 0o700);
        assert_eq!(
            fs::read_link(new_upper.join("link")).expect("readlink"),
            Path::new("sub/script")
        );
        assert_eq!(
            fs::read(new_upper.join("sub/script")).expect("read"),
            b"#!/bin/sh\n"
        );
    }

    #[test]
    fn change_permissions_like_copies_mode() {
        let (_dir, lower, upper) = setup();
        fs::set_permissions(&upper, fs::Permissions::from_mode(0o750)).expect("chmod");

        run(
            LayerRoots::new(&lower, &upper),
            vec![Action::ChangePermissionsLike {
                reference: TaggedPath::new(Root::Upper, ""),
                target: TaggedPath::new(Root::Lower, ""),
            }],
        )
        .expect("execute");
        let mode = fs::metadata(&lower).expect("stat").mode() & 0o7777;
        assert_eq!(mode, 0o750);
    }
}
