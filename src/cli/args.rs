//! CLI argument parsing structures.

use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

use super::commands::Commands;

/// Main CLI structure for secrets-env.
#[derive(Parser, Debug)]
#[command(name = "secrets-env", version)]
#[command(
    about = "Fetch secrets from Vault, AWS or GCP and run a command with them in its environment",
    long_about = None
)]
pub struct Cli {
    /// Config file (default: ./secrets-env.kdl, then ~/.config/secrets-env/)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level; RUST_LOG takes precedence when set
    #[arg(short = 'v', long, global = true, value_enum)]
    pub verbosity: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// Parse seconds, tolerating a trailing `s` as in `VAULT_CLIENT_TIMEOUT=30s`.
pub(crate) fn parse_seconds(s: &str) -> Result<u64, String> {
    s.trim()
        .trim_end_matches('s')
        .parse::<u64>()
        .map_err(|_| format!("invalid number of seconds: '{}'", s))
}
