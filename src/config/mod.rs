//! Configuration loading.

mod loader;
mod types;

pub use loader::CONFIG_FILE_NAME;
pub use types::{AwsConfig, Config, Defaults, GcpConfig, VaultConfig};
