//! secrets-env - fetch secrets from a secret store and expose them to a
//! command as environment variables.
//!
//! This crate provides:
//! - Secret addressing over key/value stores: single documents, directories,
//!   wildcard-filtered directories and KV v1/v2 path layouts
//! - Flattening of one or many secret configurations into a single map
//! - Environment injection with explicit `secret:`/`vault:` references or
//!   bulk upper-cased injection, minus the secret-store client variables
//! - Vault, AWS Secrets Manager and GCP Secret Manager stores
//!
//! # Example
//!
//! ```
//! use secrets_env::{MemoryStore, SecretAddress, inject_environment, resolve_secrets};
//! use serde_json::json;
//!
//! let store = MemoryStore::new().with_document("kv/app", json!({"api_key": "abc"}));
//! let secrets = resolve_secrets(&store, &[SecretAddress::new("kv/app").unwrap()]).unwrap();
//!
//! let env = inject_environment(&secrets, ["TOKEN=secret:api_key"]).unwrap();
//! assert_eq!(env.as_slice(), ["TOKEN=abc"]);
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod injector;
pub mod logging;
pub mod secrets;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use error::{Result, SecretsEnvError};
pub use injector::{SanitizedEnvironment, inject_environment};
pub use secrets::{
    KvVersion, MemoryStore, SecretAddress, SecretConfigSpec, SecretMap, SecretStore,
    resolve_secret, resolve_secrets,
};
