//! Script files receiving rendered plans.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use engine::{LayerRoots, Plan, ShellScriptRenderer};

use crate::error::CliError;

const SCRIPT_MODE: u32 = 0o755;

/// Renders `plan` into a new executable script.
///
/// Without `output`, the script is created in `directory` under a unique
/// `overlay-tools-XXXXXX.sh` name. Returns the script path. Nothing is left
/// behind when rendering fails.
pub(crate) fn write_script(
    plan: &Plan,
    roots: &LayerRoots,
    output: Option<&Path>,
    directory: &Path,
) -> Result<PathBuf, CliError> {
    let (path, commands) = match output {
        Some(path) => {
            let mut file = File::create(path).map_err(|source| script_error(path, source))?;
            let rendered = render_into(plan, roots, &mut file, path);
            if rendered.is_err() {
                drop(file);
                let _ = fs::remove_file(path);
            }
            (path.to_path_buf(), rendered?)
        }
        None => {
            let mut named = tempfile::Builder::new()
                .prefix("overlay-tools-")
                .suffix(".sh")
                .rand_bytes(6)
                .tempfile_in(directory)
                .map_err(|source| script_error(directory, source))?;
            let path = named.path().to_path_buf();
            let commands = render_into(plan, roots, named.as_file_mut(), &path)?;
            named
                .keep()
                .map_err(|error| script_error(&path, error.error))?;
            (path, commands)
        }
    };

    logging::trace_plan!(info, path = %path.display(), actions = plan.len(), commands, "script written");
    Ok(path)
}

/// Writes the script into `file`, flushes it to disk and makes it
/// executable. Returns the number of commands written.
fn render_into(
    plan: &Plan,
    roots: &LayerRoots,
    file: &mut File,
    path: &Path,
) -> Result<usize, CliError> {
    let mut renderer = ShellScriptRenderer::new(BufWriter::new(&mut *file), roots.clone());
    plan.deliver(&mut renderer)?;
    let commands = renderer.commands();
    renderer
        .into_inner()
        .into_inner()
        .map_err(|error| script_error(path, error.into_error()))?;
    file.sync_all().map_err(|source| script_error(path, source))?;
    file.set_permissions(fs::Permissions::from_mode(SCRIPT_MODE))
        .map_err(|source| script_error(path, source))?;
    Ok(commands)
}

fn script_error(path: &Path, source: std::io::Error) -> CliError {
    CliError::Script {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes the confirmation shown after a script was created.
pub(crate) fn announce<W: Write>(out: &mut W, path: &Path) -> std::io::Result<()> {
    writeln!(
        out,
        "The script {} is created. Run the script to do the actual work please. \
         Remember to run it when the OverlayFS is not mounted.",
        path.display()
    )
}
