//! CLI argument definitions for the results loader.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cdf-loader",
    version,
    about = "Load raw election results into the common data format",
    long_about = "Munge raw election-results files (Excel, delimited text, XML, JSON)\n\
                  into normalized VoteCount rows, driven by munger parameter files\n\
                  and a per-jurisdiction dictionary."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load one or more results files described by descriptor files.
    Load(LoadArgs),

    /// List the munger configurations in a directory.
    Mungers(MungersArgs),
}

#[derive(Parser)]
pub struct LoadArgs {
    /// Results descriptor files, one per results file to load.
    #[arg(value_name = "DESCRIPTOR", num_args = 1..)]
    pub descriptors: Vec<PathBuf>,

    /// Directory holding <name>.munger files.
    #[arg(long = "mungers", value_name = "DIR")]
    pub munger_dir: PathBuf,

    /// Jurisdiction dictionary (tab-separated dictionary.txt).
    #[arg(long = "dictionary", value_name = "FILE")]
    pub dictionary: PathBuf,

    /// Directory results_file paths are relative to (default: each
    /// descriptor's directory).
    #[arg(long = "results-dir", value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Replace counts for already-loaded dimension tuples instead of
    /// skipping them.
    #[arg(long = "upsert")]
    pub upsert: bool,

    /// Write a JSON load report per file into this directory.
    #[arg(long = "report-dir", value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// After loading, check that totals match the sum of the other vote
    /// types per contest and subdivision.
    #[arg(long = "check-totals")]
    pub check_totals: bool,

    /// After loading, print counts rolled up to the subdivision depth.
    #[arg(long = "rollup")]
    pub rollup: bool,

    /// Reporting-unit nesting depth totals are checked at (1 = top level,
    /// 2 = major subdivision).
    #[arg(long = "subdivision-depth", default_value_t = 2)]
    pub subdivision_depth: usize,
}

#[derive(Parser)]
pub struct MungersArgs {
    /// Directory to scan for <name>.munger files.
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
