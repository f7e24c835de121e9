use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, builder::OsStringValueParser, value_parser};
use engine::ReportStyle;
use metadata::XattrNamespace;

/// Operation named on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Operation {
    Vacuum,
    Diff,
    Merge,
    Deref,
}

impl Operation {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "vacuum" => Some(Self::Vacuum),
            "diff" => Some(Self::Diff),
            "merge" => Some(Self::Merge),
            "deref" => Some(Self::Deref),
            _ => None,
        }
    }

    /// Operations that only read the layers.
    pub(crate) const fn is_read_only(self) -> bool {
        matches!(self, Self::Diff)
    }
}

/// Parsed command line.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs {
    pub(crate) show_help: bool,
    pub(crate) show_version: bool,
    pub(crate) operations: Vec<String>,
    pub(crate) lower: Option<PathBuf>,
    pub(crate) upper: Option<PathBuf>,
    pub(crate) mount: Option<PathBuf>,
    pub(crate) lower_new: Option<PathBuf>,
    pub(crate) upper_new: Option<PathBuf>,
    pub(crate) yes: bool,
    pub(crate) style: ReportStyle,
    pub(crate) debug: u8,
    pub(crate) debug_flags: Option<String>,
    pub(crate) namespace: XattrNamespace,
    pub(crate) execute: bool,
    pub(crate) output: Option<PathBuf>,
}

impl ParsedArgs {
    /// The single operation to run.
    pub(crate) fn operation(&self) -> Result<Operation, String> {
        match self.operations.as_slice() {
            [name] => Operation::from_name(name)
                .ok_or_else(|| format!("action '{name}' is not supported")),
            [] => Err("please specify one action".to_owned()),
            _ => Err("please specify only one action".to_owned()),
        }
    }
}

fn path_arg(id: &'static str, short: char, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .long(id)
        .short(short)
        .value_name(value_name)
        .help(help)
        .action(ArgAction::Set)
        .value_parser(value_parser!(PathBuf))
}

/// Builds the `clap` command used for parsing.
pub(crate) fn clap_command() -> Command {
    Command::new("ovl-tools")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .action(ArgAction::SetTrue),
        )
        .arg(path_arg("lowerdir", 'l', "LOWERDIR", "The lowerdir of OverlayFS."))
        .arg(path_arg("upperdir", 'u', "UPPERDIR", "The upperdir of OverlayFS."))
        .arg(path_arg("mountdir", 'm', "MOUNTDIR", "The mountdir of OverlayFS."))
        .arg(path_arg("lowernew", 'L', "LOWERNEW", "The lowerdir of the new OverlayFS."))
        .arg(path_arg("uppernew", 'U', "UPPERNEW", "The upperdir of the new OverlayFS."))
        .arg(
            Arg::new("yes")
                .long("yes")
                .short('y')
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::SetTrue)
                .overrides_with("brief"),
        )
        .arg(
            Arg::new("brief")
                .long("brief")
                .short('b')
                .action(ArgAction::SetTrue)
                .overrides_with("verbose"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .short('d')
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("debug-flags")
                .long("debug-flags")
                .value_name("FLAGS")
                .action(ArgAction::Set)
                .value_parser(value_parser!(String)),
        )
        .arg(
            Arg::new("userxattr")
                .long("userxattr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("execute")
                .long("execute")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .action(ArgAction::Set)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("operation")
                .action(ArgAction::Append)
                .num_args(0..)
                .value_parser(OsStringValueParser::new()),
        )
}

/// Parses command-line arguments into a [`ParsedArgs`] structure.
pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from("ovl-tools"));
    }

    let mut matches = clap_command().try_get_matches_from(args)?;

    let style = if matches.get_flag("verbose") {
        ReportStyle::Verbose
    } else if matches.get_flag("brief") {
        ReportStyle::Brief
    } else {
        ReportStyle::Default
    };
    let namespace = if matches.get_flag("userxattr") {
        XattrNamespace::User
    } else {
        XattrNamespace::Trusted
    };
    let operations = matches
        .remove_many::<OsString>("operation")
        .map(|values| {
            values
                .map(|value| value.to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();

    Ok(ParsedArgs {
        show_help: matches.get_flag("help"),
        show_version: matches.get_flag("version"),
        operations,
        lower: matches.remove_one("lowerdir"),
        upper: matches.remove_one("upperdir"),
        mount: matches.remove_one("mountdir"),
        lower_new: matches.remove_one("lowernew"),
        upper_new: matches.remove_one("uppernew"),
        yes: matches.get_flag("yes"),
        style,
        debug: matches.get_count("debug"),
        debug_flags: matches.remove_one("debug-flags"),
        namespace,
        execute: matches.get_flag("execute"),
        output: matches.remove_one("output"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_options_are_recognised() {
        let parsed = parse_args([
            "ovl-tools", "-l", "/lower", "-u", "/upper", "-m", "/mnt", "-L", "/ln", "-U", "/un",
            "-y", "-dd", "vacuum",
        ])
        .expect("parse succeeds");

        assert_eq!(parsed.lower.as_deref(), Some(std::path::Path::new("/lower")));
        assert_eq!(parsed.upper.as_deref(), Some(std::path::Path::new("/upper")));
        assert_eq!(parsed.mount.as_deref(), Some(std::path::Path::new("/mnt")));
        assert_eq!(parsed.lower_new.as_deref(), Some(std::path::Path::new("/ln")));
        assert_eq!(parsed.upper_new.as_deref(), Some(std::path::Path::new("/un")));
        assert!(parsed.yes);
        assert_eq!(parsed.debug, 2);
        assert_eq!(parsed.operation(), Ok(Operation::Vacuum));
    }

    #[test]
    fn last_of_verbose_and_brief_wins() {
        let parsed = parse_args(["ovl-tools", "-v", "-b", "diff"]).expect("parse succeeds");
        assert_eq!(parsed.style, ReportStyle::Brief);

        let parsed = parse_args(["ovl-tools", "--brief", "--verbose", "diff"]).expect("parse succeeds");
        assert_eq!(parsed.style, ReportStyle::Verbose);

        let parsed = parse_args(["ovl-tools", "diff"]).expect("parse succeeds");
        assert_eq!(parsed.style, ReportStyle::Default);
    }

    #[test]
    fn long_options_with_equals() {
        let parsed = parse_args([
            "ovl-tools",
            "--lowerdir=/a",
            "--upperdir=/b",
            "--userxattr",
            "--execute",
            "--output=plan.sh",
            "merge",
        ])
        .expect("parse succeeds");
        assert_eq!(parsed.namespace, XattrNamespace::User);
        assert!(parsed.execute);
        assert_eq!(parsed.output, Some(PathBuf::from("plan.sh")));
        assert_eq!(parsed.operation(), Ok(Operation::Merge));
    }

    #[test]
    fn operation_must_be_single_and_known() {
        let parsed = parse_args(["ovl-tools"]).expect("parse succeeds");
        assert_eq!(parsed.operation(), Err("please specify one action".to_owned()));

        let parsed = parse_args(["ovl-tools", "diff", "merge"]).expect("parse succeeds");
        assert!(parsed.operation().is_err());

        let parsed = parse_args(["ovl-tools", "explode"]).expect("parse succeeds");
        assert_eq!(
            parsed.operation(),
            Err("action 'explode' is not supported".to_owned())
        );
    }

    #[test]
    fn unknown_option_is_a_parse_error() {
        assert!(parse_args(["ovl-tools", "--frobnicate", "diff"]).is_err());
    }
}
