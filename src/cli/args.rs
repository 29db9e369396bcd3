use crate::constants::{exit_codes, verbosity};
use clap::{error::ErrorKind, CommandFactory, Parser};
use log::LevelFilter;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#;

/// CLI arguments for tome.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Template directory, or a single template file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory, or output file for a single template (stdout when omitted).
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// YAML value files, merged in order.
    #[arg(short = 'f', long = "values", value_name = "FILE")]
    pub values: Vec<PathBuf>,

    /// Value overrides such as `app.port=8080`, applied after the value files.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Only process paths matching these globs.
    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Skip paths matching these globs.
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Copy files matching these globs verbatim.
    #[arg(long, value_name = "GLOB")]
    pub copy: Vec<String>,

    /// Only render files matching these globs; copy the rest.
    #[arg(long, value_name = "GLOB")]
    pub temp: Vec<String>,

    /// Suffixes removed from output path segments, such as `.tmpl`.
    #[arg(long, value_name = "SUFFIX")]
    pub strip: Vec<String>,

    /// Permissions for every output, octal (`644`) or symbolic (`rw-r--r--`).
    #[arg(long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Fail when a template reads an unset value.
    #[arg(long)]
    pub strict: bool,

    /// Overwrite existing outputs without asking.
    #[arg(long)]
    pub force: bool,

    /// Preview actions without touching the filesystem.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Increase logging verbosity (`-v`, `-vv`, `-vvv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse command line arguments with custom handling for missing required inputs.
pub fn get_args() -> Args {
    Args::try_parse().unwrap_or_else(|e| {
        if e.kind() == ErrorKind::MissingRequiredArgument {
            let mut command = Args::command().help_template(HELP_TEMPLATE);
            if let Err(print_err) = command.print_help() {
                eprintln!("Failed to display help information: {print_err}");
            } else {
                println!();
            }
            std::process::exit(exit_codes::FAILURE);
        } else {
            e.exit();
        }
    })
}

/// Map `-v` counts to the appropriate log level. Warnings, which include
/// missing value reports, are shown by default.
pub fn get_log_level_from_verbose(verbose_count: u8) -> LevelFilter {
    match verbose_count {
        verbosity::OFF => LevelFilter::Warn,
        verbosity::INFO => LevelFilter::Info,
        verbosity::DEBUG => LevelFilter::Debug,
        verbosity::TRACE.. => LevelFilter::Trace,
    }
}
