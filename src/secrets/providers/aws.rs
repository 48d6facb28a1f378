use aws_config::meta::region::RegionProviderChain;
use aws_config::sts::AssumeRoleProvider;
use aws_sdk_secretsmanager::config::http::HttpResponse;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use aws_sdk_secretsmanager::{Client, config::Region};
use tracing::{debug, info};

use super::rt;
use crate::error::{Result, SecretsEnvError, aws_message};
use crate::secrets::store::{RawDocument, SecretStore};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const CURRENT_STAGE: &str = "AWSCURRENT";
pub const PREVIOUS_STAGE: &str = "AWSPREVIOUS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSettings {
    pub region: String,
    pub role_arn: Option<String>,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            role_arn: None,
        }
    }
}

/// AWS Secrets Manager, one JSON document per secret name. Versions are
/// addressed by staging label.
pub struct AwsSecretsManagerStore {
    client: Client,
}

impl AwsSecretsManagerStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn connect(settings: &AwsSettings) -> Self {
        info!(region = %settings.region, "using AWS Secrets Manager");
        let region_provider =
            RegionProviderChain::first_try(Region::new(settings.region.clone()))
                .or_default_provider();

        let mut config_loader = aws_config::from_env().region(region_provider);
        if let Some(role_arn) = &settings.role_arn {
            debug!(role_arn = %role_arn, "assuming role for Secrets Manager access");
            let base = aws_config::from_env()
                .region(Region::new(settings.region.clone()))
                .load()
                .await;
            let provider = AssumeRoleProvider::builder(role_arn)
                .session_name("secrets-env")
                .configure(&base)
                .build()
                .await;
            config_loader = config_loader.credentials_provider(provider);
        }

        let shared_config = config_loader.load().await;
        Self::new(Client::new(&shared_config))
    }

    pub fn connect_blocking(settings: &AwsSettings) -> Result<Self> {
        rt::block_on(Self::connect(settings))
    }

    async fn fetch(&self, name: &str, stage: &str) -> Result<RawDocument> {
        let resp = self
            .client
            .get_secret_value()
            .secret_id(name)
            .version_stage(stage)
            .send()
            .await
            .map_err(|e| read_error(name, &e))?;
        let secret_string = resp.secret_string().ok_or_else(|| {
            SecretsEnvError::provider(
                "aws",
                "Secret is stored as binary, not a string. Binary secrets are not supported.",
            )
        })?;
        parse_document(name, secret_string)
    }
}

/// `ResourceNotFoundException` becomes NotFound; anything else keeps the
/// secret name and the full error chain.
fn read_error(name: &str, err: &SdkError<GetSecretValueError, HttpResponse>) -> SecretsEnvError {
    let not_found = err
        .as_service_error()
        .is_some_and(|e| e.is_resource_not_found_exception());
    let detail = aws_message(&DisplayErrorContext(err).to_string());
    SecretsEnvError::secret_read(name, not_found, detail)
}

/// Secret strings must hold a JSON object.
fn parse_document(name: &str, secret_string: &str) -> Result<RawDocument> {
    serde_json::from_str(secret_string).map_err(|e| {
        SecretsEnvError::provider(
            "aws",
            format!("bad secret JSON data in '{}', can not decode: {}", name, e),
        )
    })
}

impl SecretStore for AwsSecretsManagerStore {
    fn kind(&self) -> &str {
        "aws"
    }

    fn read(&self, path: &str) -> Result<RawDocument> {
        rt::block_on(self.fetch(path, CURRENT_STAGE))?
    }

    fn list(&self, path: &str) -> Result<Vec<String>> {
        Err(SecretsEnvError::unsupported(format!(
            "listing '{}': AWS Secrets Manager secrets are addressed by name",
            path
        )))
    }

    fn read_versioned(&self, path: &str, version: &str) -> Result<RawDocument> {
        rt::block_on(self.fetch(path, version))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let doc = parse_document("app", r#"{"user": "admin", "port": 5432}"#).unwrap();
        assert_eq!(doc["port"], 5432);
    }

    #[test]
    fn test_read_error_keeps_secret_name() {
        let err: SdkError<GetSecretValueError, HttpResponse> =
            SdkError::construction_failure("missing secret id");
        match read_error("prod/app", &err) {
            SecretsEnvError::Transport { path, message } => {
                assert_eq!(path, "prod/app");
                assert!(message.contains("missing secret id"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_document_rejects_non_object() {
        let err = parse_document("app", "plain-text").unwrap_err();
        assert!(err.to_string().starts_with("provider 'aws': bad secret JSON data in 'app'"));
    }
}
