//! Concrete secret stores and the dispatch enum used by the commands.

pub mod aws;
pub mod gcp;
pub mod rt;
pub mod vault;

pub use aws::{AwsSecretsManagerStore, AwsSettings};
pub use gcp::{GcpSecretManagerStore, GcpSettings};
pub use vault::{VaultAuth, VaultSettings, VaultStore};

use crate::error::Result;
use crate::secrets::store::{RawDocument, SecretStore};

pub enum Store {
    Vault(VaultStore),
    Aws(AwsSecretsManagerStore),
    Gcp(GcpSecretManagerStore),
}

impl Store {
    pub fn connect_aws(settings: &AwsSettings) -> Result<Self> {
        Ok(Store::Aws(AwsSecretsManagerStore::connect_blocking(settings)?))
    }

    pub fn connect_gcp(settings: &GcpSettings) -> Result<Self> {
        Ok(Store::Gcp(GcpSecretManagerStore::connect_blocking(settings)?))
    }

    fn inner(&self) -> &dyn SecretStore {
        match self {
            Store::Vault(s) => s,
            Store::Aws(s) => s,
            Store::Gcp(s) => s,
        }
    }
}

impl SecretStore for Store {
    fn kind(&self) -> &str {
        self.inner().kind()
    }

    fn read(&self, path: &str) -> Result<RawDocument> {
        self.inner().read(path)
    }

    fn list(&self, path: &str) -> Result<Vec<String>> {
        self.inner().list(path)
    }

    fn read_versioned(&self, path: &str, version: &str) -> Result<RawDocument> {
        self.inner().read_versioned(path, version)
    }
}
