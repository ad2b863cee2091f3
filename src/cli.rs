// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `trellis`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "trellis",
    version,
    about = "Serve dependency-aware task graphs as MCP tools over stdio.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory where named graphs are stored as `<name>.json`.
    ///
    /// Default: `TRELLIS_GRAPH_DIR` or the current working directory.
    #[arg(long, value_name = "PATH")]
    pub dir: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TRELLIS_LOG` or a default level will be used.
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
