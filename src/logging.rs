//! Tracing subscriber setup.
//!
//! Logs go to stderr so the launched command keeps stdout to itself.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::error::{Result, SecretsEnvError};

/// Build the filter: `RUST_LOG` when set, otherwise `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| SecretsEnvError::config(format!("invalid log level '{}': {}", level, e)))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(level: &str) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter(level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    // Already installed when tests call this more than once.
    let _ = tracing::subscriber::set_global_default(subscriber);
    Ok(())
}
