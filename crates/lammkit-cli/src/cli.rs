use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The lammkit developers",
    version,
    about = "lammkit - read, transform, and write LAMMPS data files and simulation output.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Read option defaults from a TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize the contents of a data file.
    Info(InfoArgs),
    /// Parse a data file and write it back out.
    Rewrite(RewriteArgs),
    /// Canonicalize the force-field types of a data file.
    Retype(RetypeArgs),
    /// Stream the thermodynamic tables of a log file to stdout.
    Thermo(ThermoArgs),
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the LAMMPS data file.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Atom style the Atoms section was written with (full, pqeq, molecular).
    #[arg(long, value_name = "STYLE")]
    pub atom_style: Option<String>,
}

/// Arguments for the `rewrite` subcommand.
#[derive(Args, Debug)]
pub struct RewriteArgs {
    /// Path to the LAMMPS data file to read.
    #[arg(value_name = "IN")]
    pub input: PathBuf,

    /// Path of the data file to write.
    #[arg(value_name = "OUT")]
    pub output: PathBuf,

    /// Atom style the Atoms section was written with (full, pqeq, molecular).
    #[arg(long, value_name = "STYLE")]
    pub atom_style: Option<String>,

    /// Write the force-field coefficient sections.
    #[arg(long)]
    pub coeffs: bool,

    /// Merge a coefficient fragment file into the system before writing.
    #[arg(long, value_name = "PATH")]
    pub merge_coeffs: Option<PathBuf>,
}

/// Arguments for the `retype` subcommand.
#[derive(Args, Debug)]
pub struct RetypeArgs {
    /// Path to the LAMMPS data file to read.
    #[arg(value_name = "IN")]
    pub input: PathBuf,

    /// Path of the data file to write.
    #[arg(value_name = "OUT")]
    pub output: PathBuf,

    /// Atom style the Atoms section was written with (full, pqeq, molecular).
    #[arg(long, value_name = "STYLE")]
    pub atom_style: Option<String>,

    /// Write the force-field coefficient sections.
    #[arg(long)]
    pub coeffs: bool,

    /// Merge entity types on coefficients alone, ignoring member atom types.
    #[arg(long)]
    pub ignore_atom_types: bool,

    /// Renumber molecule ids from bond connectivity as well.
    #[arg(long)]
    pub molecules: bool,
}

/// Arguments for the `thermo` subcommand.
#[derive(Args, Debug)]
pub struct ThermoArgs {
    /// Path to the LAMMPS log file.
    #[arg(value_name = "PATH")]
    pub input: PathBuf,

    /// Only read the given 1-based run instead of every run.
    #[arg(long, value_name = "N")]
    pub run: Option<usize>,
}
