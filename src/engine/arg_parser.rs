use clap::Parser;
use std::path::PathBuf;

use crate::utils::config::Defaults;

/// Parse Gaussian log files and aggregate the results as JSON.
#[derive(Clone, Debug, Parser)]
#[command(name = "gaussparse")]
#[command(about = "Parse Gaussian log files in parallel and aggregate the results as JSON.")]
pub struct Cli {
    /// Directory containing Gaussian log files.
    #[arg(value_name = "INPUT_DIR", default_value = Defaults::INPUT_DIR)]
    pub input_dir: PathBuf,

    /// Glob pattern for log files, relative to INPUT_DIR. Default: *.log
    #[arg(long, short)]
    pub pattern: Option<String>,

    /// Destination JSON file. Default: out_molecules_json/out_molecules.json
    #[arg(long, short, conflicts_with = "separate")]
    pub output: Option<PathBuf>,

    /// Write one JSON document per log file instead of one combined file.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub separate: Option<bool>,

    /// Directory for per-file documents in --separate mode. Default: out_molecules_json
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Worker thread count. Default: available parallelism.
    #[arg(long, short = 'j', value_parser = clap::value_parser!(usize))]
    pub jobs: Option<usize>,

    /// Info log file (info and above, appended). Default: parsing_info.log
    #[arg(long)]
    pub info_log: Option<PathBuf>,

    /// Error log file (errors only, appended). Default: parsing_errors.log
    #[arg(long)]
    pub error_log: Option<PathBuf>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Hide the progress bar.
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Parse a single Gaussian log file and save the record as JSON.
#[derive(Clone, Debug, Parser)]
#[command(name = "gaussparse-sample")]
#[command(about = "Parse one Gaussian log file and save its record as JSON.")]
pub struct SampleCli {
    /// Gaussian log file.
    #[arg(value_name = "LOGFILE")]
    pub logfile: PathBuf,

    /// Output JSON path. Default: LOGFILE with its extension replaced by .cclib.json
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Verbose output.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
