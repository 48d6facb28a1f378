//! `secrets-env vault`

use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use super::{Launch, launch_with_secrets};
use crate::cli::{VaultArgs, VaultBackend};
use crate::config::{Config, VaultConfig};
use crate::error::{Result, SecretsEnvError};
use crate::secrets::providers::vault::{DEFAULT_ADDRESS, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_PATH};
use crate::secrets::providers::{Store, VaultAuth, VaultSettings, VaultStore};
use crate::secrets::{SecretAddress, SecretConfigSpec};

/// Merge flags (and their env vars) over the config file and defaults.
pub fn vault_settings(config: &Config, args: &VaultArgs) -> Result<VaultSettings> {
    let file = config.vault();

    let backend = match (args.backend, file.backend.as_deref()) {
        (Some(backend), _) => backend,
        (None, Some(name)) => parse_backend(name)?,
        (None, None) => VaultBackend::default(),
    };

    let auth = match backend {
        VaultBackend::Token => VaultAuth::Token(args.token.clone().unwrap_or_default()),
        VaultBackend::Kubernetes => {
            let token_path = args
                .token_path
                .clone()
                .or_else(|| file.token_path())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH));
            VaultAuth::Kubernetes {
                role: vault_role(args, &file)?,
                token_path,
            }
        }
        VaultBackend::Gcp => {
            let project = args
                .project_id
                .clone()
                .or(config.gcp().project)
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    SecretsEnvError::validation(
                        "GCP project is missing for the gcp backend, pass it via --project-id flag or use PROJECT_ID environment variable",
                    )
                })?;
            let creds_path = args
                .google_application_credentials
                .clone()
                .filter(|p| p.is_file())
                .ok_or_else(|| {
                    SecretsEnvError::validation(
                        "google application credentials file is missing for the gcp backend, pass it via -a flag or use GOOGLE_APPLICATION_CREDENTIALS environment variable",
                    )
                })?;
            VaultAuth::Gcp {
                role: vault_role(args, &file)?,
                project,
                creds_path,
            }
        }
    };

    let address = args
        .address
        .clone()
        .or(file.address.clone())
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

    let mut settings = VaultSettings::new(address, auth);
    settings.namespace = args.namespace.clone().or(file.namespace.clone());
    settings.ca_cert = args.ca_cert.clone().or_else(|| file.ca_cert());
    settings.skip_verify = args.skip_verify || file.skip_verify.unwrap_or(false);
    settings.timeout = Duration::from_secs(
        args.timeout
            .or(file.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    );
    Ok(settings)
}

fn vault_role(args: &VaultArgs, file: &VaultConfig) -> Result<String> {
    args.role
        .clone()
        .or(file.role.clone())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| {
            SecretsEnvError::validation(
                "Vault role is missing, pass it via --role flag or use VAULT_ROLE environment variable",
            )
        })
}

fn parse_backend(name: &str) -> Result<VaultBackend> {
    match name.trim().to_ascii_lowercase().as_str() {
        "kubernetes" | "k8s" => Ok(VaultBackend::Kubernetes),
        "token" => Ok(VaultBackend::Token),
        "gcp" => Ok(VaultBackend::Gcp),
        other => Err(SecretsEnvError::config(format!(
            "unknown vault backend '{}', expected kubernetes, gcp or token",
            other
        ))),
    }
}

/// JSON `--secret-config` entries followed by the `--path` shorthand.
pub fn secret_specs(args: &VaultArgs) -> Result<Vec<SecretConfigSpec>> {
    let mut specs = args
        .secret_config
        .iter()
        .map(|json| SecretConfigSpec::parse(json))
        .collect::<Result<Vec<_>>>()?;

    if let Some(path) = args.path.as_deref().filter(|p| !p.trim().is_empty()) {
        specs.push(SecretConfigSpec::new(
            path,
            args.version.clone(),
            args.names_as_keys,
        ));
    }

    if specs.is_empty() {
        return Err(SecretsEnvError::validation(
            "Vault secret path is missing, pass it via --path flag, or set VAULT_PATH environment variable, you can also use --secret-config flag",
        ));
    }
    Ok(specs)
}

/// Handle the vault command
pub fn handle_vault(config: &Config, args: VaultArgs) -> Result<i32> {
    let launch = Launch::resolve(&args.command)?;
    let specs = secret_specs(&args)?;
    let settings = vault_settings(config, &args)?;

    let store = VaultStore::connect(&settings)?;
    let addresses = specs
        .into_iter()
        .map(|spec| {
            let (mount, kv_version) = store.discover_mount(&spec.path);
            debug!(path = %spec.path, mount = %mount, kv = %kv_version, "secret config");
            spec.into_address(kv_version, mount)
        })
        .collect::<Result<Vec<SecretAddress>>>()?;

    launch_with_secrets(&Store::Vault(store), &addresses, launch)
}
