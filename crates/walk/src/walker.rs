use crate::entry::WalkEntry;
use crate::error::WalkError;
use metadata::NodeStat;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

/// Depth-first, pre-order iterator over a single tree.
///
/// Symlinks are never followed. After a directory entry is yielded its
/// contents are read lazily on the next call to [`Iterator::next`], so
/// [`Walker::skip_current_dir`] can prune it first.
pub struct Walker {
    pub(crate) root_entry: Option<WalkEntry>,
    pub(crate) pending: Option<WalkEntry>,
    pub(crate) stack: Vec<DirectoryState>,
    pub(crate) finished: bool,
}

impl Walker {
    pub(crate) fn new(root: PathBuf) -> Result<Self, WalkError> {
        let root = absolutize(root)?;
        logging::trace_walk!(debug, root = %root.display(), "walking tree");

        let metadata = fs::symlink_metadata(&root)
            .map_err(|error| WalkError::root_metadata(root.clone(), error))?;
        let entry = WalkEntry {
            full_path: root,
            relative_path: PathBuf::new(),
            stat: NodeStat::from_metadata(&metadata),
            depth: 0,
        };

        Ok(Self {
            root_entry: Some(entry),
            pending: None,
            stack: Vec::new(),
            finished: false,
        })
    }

    /// Prevents the most recently yielded directory from being descended into.
    ///
    /// Has no effect when the last entry was not a directory.
    pub fn skip_current_dir(&mut self) {
        if let Some(entry) = self.pending.take() {
            logging::trace_walk!(trace, path = %entry.full_path.display(), "skipping subtree");
        }
    }

    fn descend_pending(&mut self) -> Result<(), WalkError> {
        if let Some(entry) = self.pending.take() {
            let state = DirectoryState::new(entry.full_path, entry.relative_path, entry.depth)?;
            self.stack.push(state);
        }
        Ok(())
    }

    fn prepare_entry(
        &mut self,
        full_path: PathBuf,
        relative_path: PathBuf,
        depth: usize,
    ) -> Result<WalkEntry, WalkError> {
        logging::trace_walk!(trace, path = %relative_path.display(), "processing entry");

        let metadata = fs::symlink_metadata(&full_path)
            .map_err(|error| WalkError::metadata(full_path.clone(), error))?;
        Ok(WalkEntry {
            full_path,
            relative_path,
            stat: NodeStat::from_metadata(&metadata),
            depth,
        })
    }

    fn emit(&mut self, entry: WalkEntry) -> WalkEntry {
        if entry.stat.kind.is_dir() {
            self.pending = Some(entry.clone());
        }
        entry
    }
}

impl Iterator for Walker {
    type Item = Result<WalkEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if let Some(entry) = self.root_entry.take() {
            return Some(Ok(self.emit(entry)));
        }

        if let Err(error) = self.descend_pending() {
            self.finished = true;
            return Some(Err(error));
        }

        loop {
            let (full_path, relative_path, depth) = {
                let state = self.stack.last_mut()?;
                match state.next_child() {
                    Some(child) => child,
                    None => {
                        self.stack.pop();
                        continue;
                    }
                }
            };

            return match self.prepare_entry(full_path, relative_path, depth) {
                Ok(entry) => Some(Ok(self.emit(entry))),
                Err(error) => {
                    self.finished = true;
                    Some(Err(error))
                }
            };
        }
    }
}

/// Sorted listing of one directory and a cursor into it.
#[derive(Clone, Debug)]
pub(crate) struct DirectoryState {
    fs_path: PathBuf,
    relative_prefix: PathBuf,
    entries: Vec<OsString>,
    index: usize,
    depth: usize,
}

impl DirectoryState {
    pub(crate) fn new(
        fs_path: PathBuf,
        relative_prefix: PathBuf,
        depth: usize,
    ) -> Result<Self, WalkError> {
        let mut entries = Vec::new();
        let read_dir =
            fs::read_dir(&fs_path).map_err(|error| WalkError::read_dir(fs_path.clone(), error))?;
        for entry in read_dir {
            let entry = entry.map_err(|error| WalkError::read_dir_entry(fs_path.clone(), error))?;
            entries.push(entry.file_name());
        }
        entries.sort();

        logging::trace_walk!(
            trace,
            "found {} entries in {}",
            entries.len(),
            fs_path.display()
        );

        Ok(Self {
            fs_path,
            relative_prefix,
            entries,
            index: 0,
            depth,
        })
    }

    fn next_name(&mut self) -> Option<OsString> {
        if let Some(name) = self.entries.get(self.index) {
            self.index += 1;
            Some(name.clone())
        } else {
            None
        }
    }

    /// Returns the full path, relative path and depth of the next child.
    pub(crate) fn next_child(&mut self) -> Option<(PathBuf, PathBuf, usize)> {
        let name = self.next_name()?;
        let full_path = self.fs_path.join(&name);
        let relative_path = if self.relative_prefix.as_os_str().is_empty() {
            PathBuf::from(&name)
        } else {
            let mut rel = self.relative_prefix.clone();
            rel.push(&name);
            rel
        };
        Some((full_path, relative_path, self.depth + 1))
    }
}

pub(crate) fn absolutize(path: PathBuf) -> Result<PathBuf, WalkError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = env::current_dir()
            .map_err(|error| WalkError::root_metadata(PathBuf::from("."), error))?;
        Ok(cwd.join(path))
    }
}
