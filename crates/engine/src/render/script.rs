use std::io::Write;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::plan::{Action, ActionSink, LayerRoots, Root, TaggedPath};

/// Writes a plan as a bash script over the root variables.
///
/// The header binds one variable per configured root; every command then
/// refers to its operands as `"$VAR"/'relative'`, so the script can be
/// reviewed and the roots edited before it is run.
pub struct ShellScriptRenderer<W: Write> {
    out: W,
    roots: LayerRoots,
    header_written: bool,
    commands: usize,
}

impl<W: Write> ShellScriptRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn new(out: W, roots: LayerRoots) -> Self {
        Self {
            out,
            roots,
            header_written: false,
            commands: 0,
        }
    }

    /// Number of commands written so far.
    #[must_use]
    pub const fn commands(&self) -> usize {
        self.commands
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn header(&mut self) -> EngineResult<()> {
        if self.header_written {
            return Ok(());
        }
        self.header_written = true;
        let mut header = b"#!/usr/bin/env bash\nset -x\n".to_vec();
        for (root, path) in self.roots.bound() {
            header.extend_from_slice(root.variable().as_bytes());
            header.push(b'=');
            header.extend_from_slice(&shell_quote(path.as_os_str().as_bytes()));
            header.push(b'\n');
        }
        self.out.write_all(&header).map_err(EngineError::Output)
    }

    fn operand(&self, path: &TaggedPath) -> EngineResult<Vec<u8>> {
        if self.roots.get(path.root()).is_none() {
            return Err(EngineError::UnboundRoot { root: path.root() });
        }
        Ok(operand(path.root(), path.relative()))
    }

    fn command(&mut self, verb: &[u8], operands: &[&TaggedPath]) -> EngineResult<()> {
        let mut line = verb.to_vec();
        for path in operands {
            line.push(b' ');
            line.extend_from_slice(&self.operand(path)?);
        }
        line.push(b'\n');
        self.out.write_all(&line).map_err(EngineError::Output)?;
        self.commands += 1;
        Ok(())
    }
}

impl<W: Write> ActionSink for ShellScriptRenderer<W> {
    fn apply(&mut self, action: &Action) -> EngineResult<()> {
        self.header()?;
        match action {
            Action::Remove(path) => self.command(b"rm -f --", &[path]),
            Action::RemoveTree(path) => self.command(b"rm -rf --", &[path]),
            Action::RemoveDir(path) => self.command(b"rmdir --", &[path]),
            Action::RemoveDirIfEmpty(path) => {
                self.command(b"rmdir --ignore-fail-on-non-empty --", &[path])
            }
            Action::Move { from, to } => self.command(b"mv -T --", &[from, to]),
            Action::Copy { from, to } => self.command(b"cp -a -T --", &[from, to]),
            Action::ChangePermissionsLike { reference, target } => {
                let mut chmod = b"chmod --reference=".to_vec();
                chmod.extend_from_slice(&self.operand(reference)?);
                chmod.extend_from_slice(b" --");
                self.command(&chmod, &[target])?;

                let mut chown = b"chown --reference=".to_vec();
                chown.extend_from_slice(&self.operand(reference)?);
                chown.extend_from_slice(b" --");
                self.command(&chown, &[target])
            }
        }
    }

    fn finish(&mut self) -> EngineResult<()> {
        self.header()?;
        self.out.flush().map_err(EngineError::Output)
    }
}

fn operand(root: Root, relative: &Path) -> Vec<u8> {
    let mut rendered = format!("\"${}\"", root.variable()).into_bytes();
    if !relative.as_os_str().is_empty() {
        rendered.push(b'/');
        rendered.extend_from_slice(&shell_quote(relative.as_os_str().as_bytes()));
    }
    rendered
}

/// Single-quotes `raw` for bash, closing and reopening the quotes around
/// every embedded `'`.
#[must_use]
pub fn shell_quote(raw: &[u8]) -> Vec<u8> {
    let mut quoted = Vec::with_capacity(raw.len() + 2);
    quoted.push(b'\'');
    for &byte in raw {
        if byte == b'\'' {
            quoted.extend_from_slice(b"'\\''");
        } else {
            quoted.push(byte);
        }
    }
    quoted.push(b'\'');
    quoted
}
