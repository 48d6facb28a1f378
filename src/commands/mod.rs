//! Command handlers for the secrets-env CLI.
//!
//! Every backend command follows the same pipeline: resolve the target
//! command, build the store from settings, resolve the configured secrets,
//! inject them into the ambient environment and launch.

mod aws;
mod gcp;
mod launch;
mod vault;

pub use aws::{aws_settings, handle_aws};
pub use gcp::{gcp_settings, handle_gcp};
pub use launch::{AmbientEnvironment, Launch, ambient_environment};
pub use vault::{handle_vault, secret_specs, vault_settings};

use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::error::Result;
use crate::injector::inject_environment;
use crate::logging;
use crate::secrets::{SecretAddress, SecretStore, resolve_secrets};

/// Parse-independent entry point: load config, set up logging, dispatch.
/// Returns the exit code to use.
pub fn run(cli: Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref())?;

    let level = cli
        .verbosity
        .map(|l| l.to_string())
        .or_else(|| config.verbosity().map(str::to_string))
        .unwrap_or_else(|| "info".to_string());
    logging::init(&level)?;

    match cli.command {
        Commands::Vault(args) => handle_vault(&config, args),
        Commands::Aws(args) => handle_aws(&config, args),
        Commands::Gcp(args) => handle_gcp(&config, args),
        Commands::Version => {
            println!("secrets-env {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Resolve, inject and launch.
pub(crate) fn launch_with_secrets<S>(
    store: &S,
    addresses: &[SecretAddress],
    launch: Launch,
) -> Result<i32>
where
    S: SecretStore + ?Sized,
{
    let secrets = resolve_secrets(store, addresses)?;
    info!(store = store.kind(), keys = secrets.len(), "secrets resolved");

    let ambient = ambient_environment();
    let env = inject_environment(&secrets, &ambient.entries)?;
    launch.run(&env, &ambient.opaque)
}
