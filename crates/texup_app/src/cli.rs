use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use serde::Deserialize;

/// Upload a PDF or image to a conversion service and fetch the LaTeX result.
#[derive(Debug, Parser)]
#[command(name = "texup", version, about)]
pub struct Cli {
    /// PDF, PNG or JPEG file to convert.
    pub input: PathBuf,

    /// Base URL of the conversion service.
    #[arg(short, long, env = "TEXUP_SERVER")]
    pub server: Option<String>,

    /// How completion is delivered.
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeSetting>,

    /// Processing style requested from the service.
    #[arg(short, long, value_enum)]
    pub text_mode: Option<TextModeSetting>,

    /// Directory the converted `.tex` file is written to.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Delay between status checks, in milliseconds.
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Consecutive failed status checks before giving up.
    #[arg(long)]
    pub max_poll_failures: Option<u32>,

    /// Declared media type of the input, instead of guessing from its extension.
    #[arg(long)]
    pub media_type: Option<String>,

    /// RON configuration file.
    #[arg(short, long, env = "TEXUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// More log output (repeat for trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print errors.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
pub enum ModeSetting {
    /// Poll the status endpoint, then download the result.
    Poll,
    /// Upload and stop once the server accepts the file.
    Acknowledge,
    /// Follow the server's event stream.
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
pub enum TextModeSetting {
    Verbatim,
    Rewriting,
    Summarizing,
}
