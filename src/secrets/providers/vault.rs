//! HashiCorp Vault key/value store over the HTTP API.
//!
//! Reads go to `GET /v1/<path>`, listings use the `LIST` verb, and pinned
//! versions add `?version=<n>`. The KV engine version and mount root of a
//! path are discovered through `sys/internal/ui/mounts`.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::error::{Result, SecretsEnvError};
use crate::secrets::address::KvVersion;
use crate::secrets::path::sanitize_path;
use crate::secrets::store::{RawDocument, SecretStore};

pub const DEFAULT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub const DEFAULT_ADDRESS: &str = "https://127.0.0.1:8200";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const KUBERNETES_LOGIN_PATH: &str = "auth/kubernetes/login";
const GCP_LOGIN_PATH: &str = "auth/gcp/login";
/// Lifetime of the JWT presented to the gcp auth backend.
const GCP_JWT_LIFETIME_SECS: u64 = 600;

/// How the store obtains its client token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultAuth {
    /// Use a token as is.
    Token(String),
    /// Exchange a Kubernetes service-account JWT for a token.
    Kubernetes { role: String, token_path: PathBuf },
    /// Present a JWT signed with a GCP service-account key to the gcp
    /// (iam) auth backend.
    Gcp {
        role: String,
        project: String,
        creds_path: PathBuf,
    },
}

/// Connection settings, assembled once from flags, environment and config.
#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub address: String,
    pub namespace: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub skip_verify: bool,
    pub timeout: Duration,
    pub auth: VaultAuth,
}

impl VaultSettings {
    pub fn new(address: impl Into<String>, auth: VaultAuth) -> Self {
        Self {
            address: address.into(),
            namespace: None,
            ca_cert: None,
            skip_verify: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            auth,
        }
    }

    fn build_http_client(&self) -> Result<Client> {
        let mut builder = Client::builder().timeout(self.timeout);
        if let Some(path) = &self.ca_cert {
            let pem = fs::read(path).map_err(|e| {
                SecretsEnvError::config(format!("failed to read CA cert {}: {}", path.display(), e))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .or_else(|_| reqwest::Certificate::from_der(&pem))
                .map_err(|e| {
                    SecretsEnvError::config(format!(
                        "failed to parse CA cert {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            builder = builder.add_root_certificate(cert);
        }
        if self.skip_verify {
            warn!("TLS verification for Vault is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build().map_err(|e| {
            SecretsEnvError::provider("vault", format!("failed to build HTTP client: {}", e))
        })
    }
}

/// An authenticated Vault client.
pub struct VaultStore {
    client: Client,
    address: String,
    namespace: Option<String>,
    token: String,
}

impl VaultStore {
    /// Build the HTTP client and log in.
    pub fn connect(settings: &VaultSettings) -> Result<Self> {
        let mut store = Self {
            client: settings.build_http_client()?,
            address: settings.address.clone(),
            namespace: settings.namespace.clone(),
            token: String::new(),
        };

        store.token = match &settings.auth {
            VaultAuth::Token(token) => {
                if token.is_empty() {
                    return Err(SecretsEnvError::config(
                        "Vault token is missing, set VAULT_TOKEN",
                    ));
                }
                token.clone()
            }
            VaultAuth::Kubernetes { role, token_path } => {
                let jwt = read_service_account_token(token_path)?;
                info!(role, "logging into Vault kubernetes auth backend");
                store.login(KUBERNETES_LOGIN_PATH, "kubernetes", role, &jwt)?
            }
            VaultAuth::Gcp {
                role,
                project,
                creds_path,
            } => {
                let key = ServiceAccountKey::from_file(creds_path)?;
                if let Some(key_project) = key.project_id.as_deref()
                    && key_project != project
                {
                    warn!(project, key_project, "service account key belongs to another project");
                }
                let jwt = gcp_login_jwt(&key, role, unix_now())?;
                info!(role, service_account = %key.client_email, "logging into Vault gcp auth backend");
                store.login(GCP_LOGIN_PATH, "gcp", role, &jwt)?
            }
        };
        Ok(store)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}",
            self.address.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if !self.token.is_empty() {
            builder = builder.header("X-Vault-Token", &self.token);
        }
        if let Some(namespace) = &self.namespace {
            builder = builder.header("X-Vault-Namespace", namespace);
        }
        builder
    }

    fn send(&self, path: &str, builder: RequestBuilder) -> Result<Response> {
        builder
            .send()
            .map_err(|e| SecretsEnvError::transport(path, format!("vault request failed: {}", e)))
    }

    /// Post `{jwt, role}` to an auth backend and keep the client token.
    fn login(&self, login_path: &str, backend: &str, role: &str, jwt: &str) -> Result<String> {
        let builder = self
            .request(Method::POST, login_path)
            .json(&json!({ "jwt": jwt, "role": role }));
        let response = self.send(login_path, builder)?;
        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(SecretsEnvError::provider(
                "vault",
                format!(
                    "failed login to Vault using {} backend: {}",
                    backend,
                    error_detail(status, &body)
                ),
            ));
        }
        let parsed: LoginResponse = serde_json::from_str(&body).map_err(|e| {
            SecretsEnvError::provider("vault", format!("failed to decode login response: {}", e))
        })?;
        parsed
            .auth
            .map(|a| a.client_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SecretsEnvError::provider("vault", "login response carried no client token"))
    }

    /// Mount root and KV version for `path`.
    pub fn kv_mount(&self, path: &str) -> Result<(String, KvVersion)> {
        let api_path = format!("sys/internal/ui/mounts/{}", sanitize_path(path));
        let response = self.send(&api_path, self.request(Method::GET, &api_path))?;
        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(SecretsEnvError::transport(api_path, error_detail(status, &body)));
        }
        let parsed: MountResponse = serde_json::from_str(&body)
            .map_err(|e| SecretsEnvError::transport(&api_path, format!("bad mount response: {}", e)))?;
        let data = parsed
            .data
            .ok_or_else(|| SecretsEnvError::not_found(format!("no mount found for {}", path)))?;
        let version = match data.options.and_then(|o| o.version).as_deref() {
            Some("2") => KvVersion::V2,
            _ => KvVersion::V1,
        };
        Ok((data.path, version))
    }

    /// Like [`VaultStore::kv_mount`] but falls back to a v1 mount at the
    /// first path segment when discovery fails.
    pub fn discover_mount(&self, path: &str) -> (String, KvVersion) {
        match self.kv_mount(path) {
            Ok((mount, version)) => {
                debug!(path, mount = %mount, kv = %version, "discovered KV mount");
                (mount, version)
            }
            Err(e) => {
                let mount = sanitize_path(path)
                    .split('/')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                warn!(path, error = %e, "KV mount discovery failed, assuming v1");
                (format!("{}/", mount), KvVersion::V1)
            }
        }
    }

    fn read_at(&self, path: &str, version: Option<&str>) -> Result<RawDocument> {
        let mut builder = self.request(Method::GET, path);
        if let Some(v) = version {
            builder = builder.query(&[("version", v)]);
        }
        let response = self.send(path, builder)?;
        let status = response.status();
        let body = response.text().unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(no_data(path)),
            status if status.is_success() => {
                let parsed: SecretResponse = serde_json::from_str(&body).map_err(|e| {
                    SecretsEnvError::transport(path, format!("bad secret response: {}", e))
                })?;
                log_warnings(path, &parsed.warnings);
                let data = parsed.data.ok_or_else(|| no_data(path))?;
                // A deleted v2 version still answers, with a null payload.
                if matches!(data.get("data"), Some(Value::Null)) && data.contains_key("metadata") {
                    return Err(no_data(path));
                }
                Ok(data)
            }
            status => Err(SecretsEnvError::transport(path, error_detail(status, &body))),
        }
    }
}

impl SecretStore for VaultStore {
    fn kind(&self) -> &str {
        "vault"
    }

    fn read(&self, path: &str) -> Result<RawDocument> {
        self.read_at(path, None)
    }

    fn list(&self, path: &str) -> Result<Vec<String>> {
        let method = Method::from_bytes(b"LIST")
            .map_err(|e| SecretsEnvError::Other(format!("invalid HTTP method: {}", e)))?;
        let response = self.send(path, self.request(method, path))?;
        let status = response.status();
        let body = response.text().unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(SecretsEnvError::not_found(format!(
                "no value found at: {}, check the path",
                path
            ))),
            status if status.is_success() => {
                let list: KeyListResponse = serde_json::from_str(&body).map_err(|e| {
                    SecretsEnvError::transport(path, format!("failed to decode key list: {}", e))
                })?;
                log_warnings(path, &list.warnings);
                Ok(list.data.and_then(|d| d.keys).unwrap_or_default())
            }
            status => Err(SecretsEnvError::transport(path, error_detail(status, &body))),
        }
    }

    fn read_versioned(&self, path: &str, version: &str) -> Result<RawDocument> {
        self.read_at(path, Some(version))
    }
}

fn read_service_account_token(path: &Path) -> Result<String> {
    info!(path = %path.display(), "reading Kubernetes service account token");
    let jwt = fs::read_to_string(path).map_err(|e| {
        SecretsEnvError::config(format!(
            "failed to read service account token file {}: {}, \
             use --token-path or TOKEN_PATH for another location",
            path.display(),
            e
        ))
    })?;
    Ok(jwt.trim().to_string())
}

/// The fields of a GCP service-account JSON key file needed to sign a login JWT.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SecretsEnvError::config(format!(
                "failed to read GCP credentials file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            SecretsEnvError::config(format!(
                "{} is not a service account key file: {}",
                path.display(),
                e
            ))
        })
    }
}

/// Claims the gcp auth backend checks on an iam login.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GcpLoginClaims {
    pub sub: String,
    pub aud: String,
    pub exp: u64,
}

/// Sign the login JWT for `role` with the service-account key. Vault looks
/// the public key up by `kid`, so the header carries `private_key_id`.
pub fn gcp_login_jwt(key: &ServiceAccountKey, role: &str, now: u64) -> Result<String> {
    let claims = GcpLoginClaims {
        sub: key.client_email.clone(),
        aud: format!("vault/{}", role),
        exp: now + GCP_JWT_LIFETIME_SECS,
    };
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key.private_key_id.clone());

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
        SecretsEnvError::config(format!("invalid service account private key: {}", e))
    })?;
    jsonwebtoken::encode(&header, &claims, &encoding_key).map_err(|e| {
        SecretsEnvError::provider("vault", format!("failed to sign gcp login JWT: {}", e))
    })
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn no_data(path: &str) -> SecretsEnvError {
    SecretsEnvError::not_found(format!("no secret data found at path: {}", path))
}

fn log_warnings(path: &str, warnings: &Option<Vec<String>>) {
    for warning in warnings.iter().flatten() {
        warn!(path, warning = %warning, "vault returned a warning");
    }
}

/// Status plus Vault's `errors` list, e.g. `403 Forbidden: permission denied`.
fn error_detail(status: StatusCode, body: &str) -> String {
    let errors = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.errors.join("; "))
        .filter(|e| !e.is_empty());
    match errors {
        Some(errors) => format!("{}: {}", status, errors),
        None if body.trim().is_empty() => status.to_string(),
        None => format!("{}: {}", status, body.trim()),
    }
}

#[derive(Deserialize)]
struct SecretResponse {
    data: Option<RawDocument>,
    #[serde(default)]
    warnings: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct KeyListResponse {
    data: Option<KeyListData>,
    #[serde(default)]
    warnings: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct KeyListData {
    keys: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Deserialize)]
struct MountResponse {
    data: Option<MountData>,
}

#[derive(Deserialize)]
struct MountData {
    path: String,
    options: Option<MountOptions>,
}

#[derive(Deserialize)]
struct MountOptions {
    version: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}
