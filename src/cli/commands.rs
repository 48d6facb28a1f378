//! Command and subcommand definitions.

use clap::builder::BoolishValueParser;
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::args::parse_seconds;

/// Vault authentication backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum VaultBackend {
    /// Log in with the Kubernetes service account token
    #[default]
    Kubernetes,
    /// Use VAULT_TOKEN as is
    Token,
    /// Log in with a JWT signed by a GCP service account key
    Gcp,
}

/// Top-level commands available in secrets-env.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch secrets from HashiCorp Vault and run a command with them
    Vault(VaultArgs),
    /// Fetch a secret from AWS Secrets Manager and run a command with it
    Aws(AwsArgs),
    /// Fetch a secret from GCP Secret Manager and run a command with it
    Gcp(GcpArgs),
    /// Print the version
    Version,
}

/// Secret paths ending in `/` are read as directories; the last segment may
/// carry a `*` wildcard (`db*`, `*db`, `*user*`). Explicit references such as
/// `DB_PASS=secret:password` in the environment restrict injection to those
/// variables.
#[derive(Args, Debug)]
pub struct VaultArgs {
    /// Authentication backend
    #[arg(short = 'b', long, env = "VAULT_BACKEND", value_enum)]
    pub backend: Option<VaultBackend>,

    /// Vault role for the kubernetes backend
    #[arg(long, env = "VAULT_ROLE")]
    pub role: Option<String>,

    /// Kubernetes service account token file
    #[arg(long, env = "TOKEN_PATH", value_name = "FILE")]
    pub token_path: Option<PathBuf>,

    /// GCP project for the gcp backend
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: Option<String>,

    /// Service account JSON key file for the gcp backend
    #[arg(short = 'a', long, env = "GOOGLE_APPLICATION_CREDENTIALS", value_name = "FILE")]
    pub google_application_credentials: Option<PathBuf>,

    /// Vault server address
    #[arg(long, env = "VAULT_ADDR")]
    pub address: Option<String>,

    /// Vault token for the token backend
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Vault Enterprise namespace
    #[arg(long, env = "VAULT_NAMESPACE")]
    pub namespace: Option<String>,

    /// PEM bundle used to verify the Vault server certificate
    #[arg(long, env = "VAULT_CACERT", value_name = "FILE")]
    pub ca_cert: Option<PathBuf>,

    /// Skip TLS verification
    #[arg(long, env = "VAULT_SKIP_VERIFY", value_parser = BoolishValueParser::new())]
    pub skip_verify: bool,

    /// Request timeout in seconds
    #[arg(long, env = "VAULT_CLIENT_TIMEOUT", value_parser = parse_seconds)]
    pub timeout: Option<u64>,

    /// Secret path, a trailing "/" reads every secret below it
    #[arg(long, env = "VAULT_PATH")]
    pub path: Option<String>,

    /// Secret version on a KV v2 store (default: latest)
    #[arg(long, env = "SECRET_VERSION")]
    pub version: Option<String>,

    /// Use secret names under the path as variable names
    #[arg(
        long,
        env = "VAULT_USE_SECRET_NAMES_AS_KEYS",
        value_parser = BoolishValueParser::new()
    )]
    pub names_as_keys: bool,

    /// Secret as JSON, repeatable:
    /// '{"path": "secret/app/", "version": "3", "use-secret-names-as-keys": true}'
    #[arg(long = "secret-config", value_name = "JSON")]
    pub secret_config: Vec<String>,

    /// Command to run, after --
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct AwsArgs {
    /// AWS region (default: us-east-1)
    #[arg(long, env = "REGION")]
    pub region: Option<String>,

    /// Role to assume before reading the secret
    #[arg(long, env = "ROLE_ARN")]
    pub role_arn: Option<String>,

    /// Secret name or ARN
    #[arg(long, env = "SECRET_NAME")]
    pub secret_name: String,

    /// Read the AWSPREVIOUS version instead of AWSCURRENT
    #[arg(long, env = "PREVIOUS_VERSION", value_parser = BoolishValueParser::new())]
    pub previous_version: bool,

    /// Command to run, after --
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct GcpArgs {
    /// GCP project holding the secret
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: Option<String>,

    /// Secret name
    #[arg(long, env = "SECRET_NAME")]
    pub secret_name: String,

    /// Secret version
    #[arg(long, env = "SECRET_VERSION", default_value = "latest")]
    pub secret_version: String,

    /// Service account JSON key file
    #[arg(short = 'a', long, env = "GOOGLE_APPLICATION_CREDENTIALS", value_name = "FILE")]
    pub google_application_credentials: Option<PathBuf>,

    /// Command to run, after --
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}
