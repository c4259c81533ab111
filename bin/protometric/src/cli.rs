use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(about, version)]
pub struct Cli {
    /// Enable verbose output. (Specify twice for more verbosity.)
    #[arg(global = true, short = 'v', long, action = ArgAction::Count, default_value_t = 0)]
    verbose: u8,

    /// Path to a configuration file.
    ///
    /// Files ending in `.json` are read as JSON, anything else as YAML.
    ///
    /// Settings can also be given as environment variables prefixed with `PROTOMETRIC_` (for example,
    /// `PROTOMETRIC_PREPEND_LENGTH=false`), which take precedence over the configuration file.
    #[arg(global = true, short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub action: Action,
}

impl Cli {
    /// Gets the configured log level based on the user-supplied verbosity level.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

#[derive(Subcommand)]
pub enum Action {
    /// Encode newline-delimited JSON metrics into the binary format.
    #[command(name = "encode")]
    Encode(EncodeConfig),

    /// Decode metrics from the binary format into newline-delimited JSON.
    #[command(name = "decode")]
    Decode(DecodeConfig),
}

/// Encode configuration.
#[derive(Args, Clone)]
pub struct EncodeConfig {
    /// Path to read JSON metrics from. Defaults to standard input.
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Path to write encoded metrics to. Defaults to standard output.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
}

/// Decode configuration.
#[derive(Args, Clone)]
pub struct DecodeConfig {
    /// Path to read encoded metrics from. Defaults to standard input.
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,
}
