// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `checkrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "checkrun",
    version,
    about = "Run a set of test programs and report aggregate pass/fail counts.",
    long_about = None
)]
pub struct CliArgs {
    /// Test identifiers to run.
    ///
    /// When given, these override both the `TESTS` environment variable and
    /// the `tests` list in the descriptor file.
    #[arg(value_name = "TEST")]
    pub tests: Vec<String>,

    /// Directory the tests live (and run) in.
    ///
    /// Default: the descriptor file's directory, or the current working
    /// directory.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Explicit path to the descriptor file (`Checkrun.toml`).
    ///
    /// Tests are resolved relative to the descriptor's directory, so this
    /// works from any working directory.
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Maximum number of tests running simultaneously.
    ///
    /// With no value the budget is unlimited. Without the flag, execution is
    /// serial unless a make jobserver is inherited from the environment, in
    /// which case slots are acquired from the shared pool.
    #[arg(short = 'j', long, value_name = "N", num_args = 0..=1)]
    pub jobs: Option<Option<usize>>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CHECKRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
