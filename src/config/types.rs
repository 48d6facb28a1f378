//! Configuration type definitions.

use knuffel::Decode;
use std::path::PathBuf;

/// Expand tilde (~) prefix to the user's home directory.
/// Handles both "~" alone and "~/path/to/something" patterns.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

/// Main configuration structure parsed from secrets-env.kdl.
#[derive(Debug, Decode, Clone, Default)]
pub struct Config {
    #[knuffel(child)]
    pub defaults: Option<Defaults>,

    #[knuffel(child)]
    pub vault: Option<VaultConfig>,

    #[knuffel(child)]
    pub aws: Option<AwsConfig>,

    #[knuffel(child)]
    pub gcp: Option<GcpConfig>,
}

#[derive(Debug, Decode, Clone, Default)]
pub struct Defaults {
    /// Log level when neither `-v` nor `RUST_LOG` is given.
    #[knuffel(property)]
    pub verbosity: Option<String>,
}

/// `vault address="https://vault:8200" role="app" backend="kubernetes"`
#[derive(Debug, Decode, Clone, Default)]
pub struct VaultConfig {
    #[knuffel(property)]
    pub address: Option<String>,

    #[knuffel(property)]
    pub role: Option<String>,

    #[knuffel(property)]
    pub backend: Option<String>,

    #[knuffel(property(name = "token-path"))]
    pub token_path: Option<String>,

    #[knuffel(property)]
    pub namespace: Option<String>,

    #[knuffel(property(name = "ca-cert"))]
    pub ca_cert: Option<String>,

    #[knuffel(property(name = "skip-verify"))]
    pub skip_verify: Option<bool>,

    /// Request timeout in seconds.
    #[knuffel(property)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Decode, Clone, Default)]
pub struct AwsConfig {
    #[knuffel(property)]
    pub region: Option<String>,

    #[knuffel(property(name = "role-arn"))]
    pub role_arn: Option<String>,
}

#[derive(Debug, Decode, Clone, Default)]
pub struct GcpConfig {
    #[knuffel(property)]
    pub project: Option<String>,
}

impl Config {
    /// Configured log level, if any.
    pub fn verbosity(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.verbosity.as_deref())
    }

    pub fn vault(&self) -> VaultConfig {
        self.vault.clone().unwrap_or_default()
    }

    pub fn aws(&self) -> AwsConfig {
        self.aws.clone().unwrap_or_default()
    }

    pub fn gcp(&self) -> GcpConfig {
        self.gcp.clone().unwrap_or_default()
    }
}

impl VaultConfig {
    pub fn token_path(&self) -> Option<PathBuf> {
        self.token_path.as_deref().map(expand_tilde)
    }

    pub fn ca_cert(&self) -> Option<PathBuf> {
        self.ca_cert.as_deref().map(expand_tilde)
    }
}
