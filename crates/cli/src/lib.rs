#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `ovl-tools` command line. It parses the layer
//! directories and options, validates them into an
//! [`engine::OverlayConfig`], runs one of the four operations, and hands
//! the resulting plan to a script file or, with `--execute`, straight to
//! the filesystem.
//!
//! # Design
//!
//! [`run`] takes the arguments together with handles for standard output
//! and error and returns the process exit code, so the binary stays a thin
//! wrapper and tests can capture every byte written. Standard input is read
//! only for the confirmation prompts.
//!
//! # Invariants
//!
//! - `run` never panics; every failure becomes exit code `1` and a single
//!   `ovl-tools: error: ...` line on standard error.
//! - Standard output carries the diff report, prompts and the script
//!   announcement. Logging goes to standard error.
//! - No script is written and nothing is executed unless the operation
//!   completed without error.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run(["ovl-tools", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(status, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("ovl-tools "));
//! ```

mod args;
mod error;
mod mounts;
mod probe;
mod script;

use std::ffi::OsString;
use std::io::{self, BufRead, Write};
use std::path::Path;

use engine::{
    DerefTarget, EngineError, Executor, OverlayConfig, Plan, deref, diff, merge, vacuum,
};
use logging::VerbosityConfig;

use args::{Operation, ParsedArgs, parse_args};
pub use error::CliError;
use mounts::{MountStatus, PROC_MOUNTS, check_mounted};

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

const PROGRAM: &str = "ovl-tools";

/// Deterministic help text.
const HELP_TEXT: &str = concat!(
    "Usage: ovl-tools COMMAND [OPTIONS]\n",
    "\n",
    "Commands:\n",
    "  vacuum - remove duplicated files in upperdir where copy_up is done but the file is not actually modified\n",
    "  diff   - show the list of actually changed files\n",
    "  merge  - merge all changes from upperdir to lowerdir, and clear upperdir\n",
    "  deref  - copy changes from upperdir unfolding redirect and metacopy, optionally into a new upperdir\n",
    "\n",
    "Options:\n",
    "  -l, --lowerdir=LOWERDIR    the lowerdir of OverlayFS (required)\n",
    "  -u, --upperdir=UPPERDIR    the upperdir of OverlayFS (required)\n",
    "  -m, --mountdir=MOUNTDIR    the mountdir of OverlayFS (required by deref)\n",
    "  -L, --lowernew=LOWERNEW    the lowerdir of new OverlayFS (optional)\n",
    "  -U, --uppernew=UPPERNEW    the upperdir of new OverlayFS (optional)\n",
    "  -y, --yes                  don't prompt if OverlayFS is still mounted (optional)\n",
    "  -v, --verbose              with diff action only: when a directory only exists in one version, still list every file of the directory\n",
    "  -b, --brief                with diff action only: conform to output of diff --brief --recursive --no-dereference\n",
    "      --userxattr            read overlay markers from user.overlay.* instead of trusted.overlay.*\n",
    "      --execute              apply the changes directly instead of writing a script\n",
    "  -o, --output=FILE          write the script to FILE instead of overlay-tools-XXXXXX.sh\n",
    "  -d, --debug                increase diagnostic output on standard error (repeatable)\n",
    "      --debug-flags=FLAGS    per-subsystem diagnostics, e.g. walk2,plan\n",
    "  -h, --help                 show this help text\n",
    "  -V, --version              show version information\n",
);

/// Runs the CLI using the provided argument iterator and output handles.
///
/// Confirmation prompts read from the process's standard input.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let stdin = io::stdin();
    run_with_input(arguments, &mut stdin.lock(), stdout, stderr)
}

/// Like [`run`], reading prompt answers from `input`.
pub fn run_with_input<I, S, In, Out, Err>(
    arguments: I,
    input: &mut In,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    In: BufRead,
    Out: Write,
    Err: Write,
{
    let parsed = match parse_args(arguments) {
        Ok(parsed) => parsed,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM}: error: {}", error.to_string().trim_end());
            let _ = writeln!(stderr, "Try '{PROGRAM} --help' for more information.");
            return 1;
        }
    };

    if parsed.show_help {
        return if stdout.write_all(HELP_TEXT.as_bytes()).is_ok() { 0 } else { 1 };
    }
    if parsed.show_version {
        let written = writeln!(stdout, "{PROGRAM} {}", env!("CARGO_PKG_VERSION"));
        return if written.is_ok() { 0 } else { 1 };
    }

    match execute(&parsed, input, stdout) {
        Ok(()) => 0,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM}: error: {error}");
            if error.aborted_operation() {
                let _ = writeln!(stderr, "Action aborted due to fatal error.");
            }
            if error.suggests_help() {
                let _ = writeln!(stderr, "Try '{PROGRAM} --help' for more information.");
            }
            1
        }
    }
}

fn init_logging(parsed: &ParsedArgs) -> Result<(), CliError> {
    let mut verbosity = VerbosityConfig::from_verbose_level(parsed.debug);
    if let Some(flags) = &parsed.debug_flags {
        verbosity.apply_flags(flags).map_err(CliError::Usage)?;
    }
    logging::init_tracing(&verbosity);
    Ok(())
}

fn execute<In: BufRead, Out: Write>(
    parsed: &ParsedArgs,
    input: &mut In,
    stdout: &mut Out,
) -> Result<(), CliError> {
    init_logging(parsed)?;
    let operation = parsed.operation().map_err(CliError::Usage)?;

    let mut builder = OverlayConfig::builder();
    if let Some(lower) = &parsed.lower {
        builder = builder.lower(lower);
    }
    if let Some(upper) = &parsed.upper {
        builder = builder.upper(upper);
    }
    let config = builder
        .mount(parsed.mount.clone())
        .lower_new(parsed.lower_new.clone())
        .upper_new(parsed.upper_new.clone())
        .namespace(parsed.namespace)
        .style(parsed.style)
        .require_mount(operation == Operation::Deref)
        .build()?;
    logging::trace_plan!(debug, ?operation, ?config, "configuration validated");

    if !operation.is_read_only() {
        probe::probe_xattr(config.upper(), config.namespace())?;
    }

    let creates_new_layers = config.lower_new().is_some() && config.upper_new().is_some();
    if !creates_new_layers {
        let status = check_mounted(Path::new(PROC_MOUNTS), config.lower(), config.upper());
        if let MountStatus::Unknown(reason) = &status {
            logging::trace_mount!(warn, "{reason}");
        }
        if status.may_be_mounted() {
            if status == MountStatus::Mounted {
                writeln!(stdout, "The OverlayFS involved is still mounted.").map_err(output)?;
            }
            if !parsed.yes {
                confirm(
                    "It is strongly recommended to unmount OverlayFS first. \
                     Still continue (not recommended)?: ",
                    input,
                    stdout,
                )?;
            }
        }
    }

    let inspector = config.inspector();
    let plan = match operation {
        Operation::Diff => {
            diff(config.lower(), config.upper(), config.style(), &inspector, &mut *stdout)?;
            return Ok(());
        }
        Operation::Vacuum => vacuum(config.lower(), config.upper(), &inspector)?,
        Operation::Merge => merge(config.lower(), config.upper(), &inspector)?,
        Operation::Deref => {
            let target = if config.upper_new().is_some() {
                DerefTarget::NewUpper
            } else {
                DerefTarget::InPlace
            };
            let mount = config.mount().ok_or(engine::ConfigError::MissingMount)?;
            deref(mount, config.upper(), target, &inspector)?
        }
    };

    deliver(parsed, &config, &plan, input, stdout)
}

fn deliver<In: BufRead, Out: Write>(
    parsed: &ParsedArgs,
    config: &OverlayConfig,
    plan: &Plan,
    input: &mut In,
    stdout: &mut Out,
) -> Result<(), CliError> {
    if parsed.execute {
        if !parsed.yes {
            confirm(
                &format!("Apply {} planned changes now?: ", plan.len()),
                input,
                stdout,
            )?;
        }
        let mut executor = Executor::new(config.roots().clone());
        plan.deliver(&mut executor)?;
        writeln!(stdout, "Applied {} changes.", executor.applied()).map_err(output)?;
        return Ok(());
    }

    let path = script::write_script(plan, config.roots(), parsed.output.as_deref(), Path::new("."))?;
    script::announce(stdout, &path).map_err(output)
}

/// Prints `question` and accepts only an answer starting with `Y` or `y`.
fn confirm<In: BufRead, Out: Write>(
    question: &str,
    input: &mut In,
    stdout: &mut Out,
) -> Result<(), CliError> {
    writeln!(stdout, "{question}").map_err(output)?;
    stdout.flush().map_err(output)?;
    let mut answer = String::new();
    input.read_line(&mut answer).map_err(output)?;
    if answer.starts_with(['Y', 'y']) {
        Ok(())
    } else {
        Err(CliError::Declined)
    }
}

fn output(error: io::Error) -> CliError {
    CliError::Engine(EngineError::Output(error))
}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(clamped as u8)
}
