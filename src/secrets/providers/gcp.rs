use google_cloud_gax::error::Error as GaxError;
use google_cloud_gax::error::rpc::Code;
use google_cloud_secretmanager_v1::client::SecretManagerService;
use tracing::info;

use super::rt;
use crate::error::{Result, SecretsEnvError, gcp_message};
use crate::secrets::store::{RawDocument, SecretStore};

pub const LATEST_VERSION: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpSettings {
    pub project_id: String,
}

/// Google Cloud Secret Manager, one JSON payload per secret version.
pub struct GcpSecretManagerStore {
    client: SecretManagerService,
    project_id: String,
}

impl GcpSecretManagerStore {
    pub fn new(client: SecretManagerService, project_id: String) -> Self {
        Self { client, project_id }
    }

    pub async fn connect(settings: &GcpSettings) -> Result<Self> {
        info!(project = %settings.project_id, "creating GCP Secret Manager client");
        let client = SecretManagerService::builder()
            .build()
            .await
            .map_err(SecretsEnvError::gcp)?;
        Ok(Self::new(client, settings.project_id.clone()))
    }

    pub fn connect_blocking(settings: &GcpSettings) -> Result<Self> {
        rt::block_on(Self::connect(settings))?
    }

    /// Format: `projects/{project_id}/secrets/{secret_id}/versions/{version}`
    fn version_name(&self, name: &str, version: &str) -> String {
        version_name(&self.project_id, name, version)
    }

    async fn access(&self, name: &str, version: &str) -> Result<RawDocument> {
        let version_name = self.version_name(name, version);
        info!(secret = %version_name, "getting secret from GCP Secret Manager");
        let resp = self
            .client
            .access_secret_version()
            .set_name(&version_name)
            .send()
            .await
            .map_err(|e| read_error(&version_name, &e))?;

        let payload = resp
            .payload
            .ok_or_else(|| SecretsEnvError::provider("gcp", "Secret version has no payload"))?;
        parse_payload(name, &payload.data)
    }
}

fn version_name(project_id: &str, name: &str, version: &str) -> String {
    format!("projects/{}/secrets/{}/versions/{}", project_id, name, version)
}

/// A `NOT_FOUND` status becomes NotFound; anything else keeps the version
/// name and the cause.
fn read_error(version_name: &str, err: &GaxError) -> SecretsEnvError {
    let not_found = err.status().is_some_and(|s| s.code == Code::NotFound);
    SecretsEnvError::secret_read(version_name, not_found, gcp_message(&err.to_string()))
}

fn parse_payload(name: &str, data: &[u8]) -> Result<RawDocument> {
    serde_json::from_slice(data).map_err(|e| {
        SecretsEnvError::provider(
            "gcp",
            format!("bad secret JSON data in '{}', can not decode: {}", name, e),
        )
    })
}

impl SecretStore for GcpSecretManagerStore {
    fn kind(&self) -> &str {
        "gcp"
    }

    fn read(&self, path: &str) -> Result<RawDocument> {
        rt::block_on(self.access(path, LATEST_VERSION))?
    }

    fn list(&self, path: &str) -> Result<Vec<String>> {
        Err(SecretsEnvError::unsupported(format!(
            "listing '{}': GCP secrets are addressed by name",
            path
        )))
    }

    fn read_versioned(&self, path: &str, version: &str) -> Result<RawDocument> {
        rt::block_on(self.access(path, version))?
    }
}
