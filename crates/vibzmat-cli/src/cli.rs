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
    version,
    about = "vibzmat - Inspect, animate and compare molecular vibrations from Molden files in Cartesian and internal coordinates.",
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

    /// Path to a TOML configuration file.
    /// Defaults to `vibzmat/config.toml` in the platform configuration directory, if present.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S output.precision=8
    #[arg(short = 'S', long = "set", global = true, value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the vibrational modes of a Molden frequency file.
    Modes(ModesArgs),
    /// Write a Molden trajectory that follows one vibrational mode.
    Animate(AnimateArgs),
    /// Combine XYZ and Molden geometries into one Molden trajectory.
    Convert(ConvertArgs),
    /// Check whether two geometries are equal within tolerances.
    Compare(CompareArgs),
    /// Open geometries in the configured external viewer.
    View(ViewArgs),
}

/// Options controlling how modes are read from a Molden file.
#[derive(Args, Debug, Clone, Default)]
pub struct VibrationArgs {
    /// Index assigned to the first mode and first atom.
    #[arg(long, value_name = "INT")]
    pub start_index: Option<usize>,

    /// Keep zero-frequency (translational and rotational) modes.
    #[arg(long)]
    pub keep_trans_rot: bool,

    /// CSV construction table for internal coordinates.
    /// Derived from the reference geometry when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub table: Option<PathBuf>,
}

/// Options controlling how trajectories are written.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Number of decimals written for coordinates.
    #[arg(short, long, value_name = "INT")]
    pub precision: Option<usize>,

    /// Keep the atom order of the input instead of sorting by atom index.
    #[arg(long)]
    pub no_sort: bool,

    /// Fail instead of replacing an existing output file.
    #[arg(long)]
    pub no_overwrite: bool,
}

/// Arguments for the `modes` subcommand.
#[derive(Args, Debug)]
pub struct ModesArgs {
    /// Molden file with [FREQ], [FR-COORD] and [FR-NORM-COORD] sections.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    #[command(flatten)]
    pub vibration: VibrationArgs,

    /// Also project the modes into internal coordinates and print their deltas.
    #[arg(short, long)]
    pub internal: bool,

    /// Write the construction table used for the internal projection to a CSV file.
    #[arg(long, value_name = "PATH", requires = "internal")]
    pub export_table: Option<PathBuf>,
}

/// Arguments for the `animate` subcommand.
#[derive(Args, Debug)]
pub struct AnimateArgs {
    /// Molden file with [FREQ], [FR-COORD] and [FR-NORM-COORD] sections.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Index of the mode to follow.
    #[arg(short, long, required = true, value_name = "INT")]
    pub mode: usize,

    /// Path for the output Molden trajectory.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Largest amplitude sampled on either side of the reference.
    #[arg(short = 'a', long, default_value_t = 1.0, value_name = "FLOAT")]
    pub max_amplitude: f64,

    /// Number of frames in the trajectory.
    #[arg(short = 'n', long, default_value_t = 21, value_name = "INT")]
    pub steps: usize,

    /// Displace in internal coordinates instead of Cartesian ones.
    #[arg(short, long)]
    pub internal: bool,

    #[command(flatten)]
    pub vibration: VibrationArgs,

    #[command(flatten)]
    pub output_options: OutputArgs,
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input XYZ or Molden files, concatenated in the given order.
    #[arg(required = true, num_args = 1.., value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Path for the output Molden trajectory.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Index assigned to the first atom of every geometry.
    #[arg(long, value_name = "INT")]
    pub start_index: Option<usize>,

    #[command(flatten)]
    pub output_options: OutputArgs,
}

/// Arguments for the `compare` subcommand.
#[derive(Args, Debug)]
pub struct CompareArgs {
    /// First geometry (XYZ or Molden).
    #[arg(required = true, value_name = "PATH")]
    pub first: PathBuf,

    /// Second geometry (XYZ or Molden).
    #[arg(required = true, value_name = "PATH")]
    pub second: PathBuf,

    /// Which geometry of each file to compare when it holds a trajectory.
    #[arg(long, default_value_t = 0, value_name = "INT")]
    pub frame: usize,

    /// Compare raw coordinates without moving to the principal axis frame.
    #[arg(long)]
    pub no_align: bool,

    /// Relative tolerance.
    #[arg(long, default_value_t = 1e-5, value_name = "FLOAT")]
    pub rtol: f64,

    /// Absolute tolerance in Angstroms.
    #[arg(long, default_value_t = 1e-8, value_name = "FLOAT")]
    pub atol: f64,
}

/// Arguments for the `view` subcommand.
#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Input XYZ or Molden files, shown as one trajectory.
    #[arg(required = true, num_args = 1.., value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Viewer executable, overriding `viewer.program`.
    #[arg(long, value_name = "PROGRAM")]
    pub program: Option<String>,

    /// Write the viewer file to the current directory and keep it.
    #[arg(long)]
    pub keep: bool,
}
