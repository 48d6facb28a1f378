//! Command-line interface definitions.

mod args;
mod commands;

pub use args::{Cli, LogLevel};
pub use commands::{AwsArgs, Commands, GcpArgs, VaultArgs, VaultBackend};
