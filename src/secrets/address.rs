//! Backend-agnostic secret addresses and their JSON configuration form.

use serde::{Deserialize, Deserializer};
use std::fmt;

use crate::error::{Result, SecretsEnvError};

/// Addressing scheme of the key/value store an address points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KvVersion {
    /// Plain paths, unversioned payloads.
    #[default]
    V1,
    /// Paths routed through `<mount>/data/` and `<mount>/metadata/`,
    /// payloads wrapped in a `data` envelope, historical versions readable.
    V2,
}

impl fmt::Display for KvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvVersion::V1 => write!(f, "v1"),
            KvVersion::V2 => write!(f, "v2"),
        }
    }
}

/// A requested secret: one document, a directory of documents, or a
/// wildcard-filtered directory.
///
/// A trailing `/` or an embedded `*` makes the address multi-key, and so does
/// `names_as_keys`, unless the address is pinned as a document, as cloud
/// secret names always are. For a v2 address with an empty mount root the path is used
/// without a `data`/`metadata` prefix; cloud stores address secrets by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretAddress {
    path: String,
    kv_version: KvVersion,
    mount: String,
    version: Option<String>,
    names_as_keys: bool,
    document: bool,
}

impl SecretAddress {
    /// Create a v1 address. Fails on an empty (or whitespace-only) path.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(SecretsEnvError::addressing("secret path is empty"));
        }
        Ok(Self {
            path,
            kv_version: KvVersion::V1,
            mount: String::new(),
            version: None,
            names_as_keys: false,
            document: false,
        })
    }

    pub fn with_store(mut self, kv_version: KvVersion, mount: impl Into<String>) -> Self {
        self.kv_version = kv_version;
        self.mount = mount.into();
        self
    }

    /// Pin a version. Blank strings are treated as "no version".
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn with_names_as_keys(mut self, names_as_keys: bool) -> Self {
        self.names_as_keys = names_as_keys;
        self
    }

    /// Always read the path as one named document, taken verbatim.
    pub fn as_document(mut self) -> Self {
        self.document = true;
        self
    }

    pub fn is_document(&self) -> bool {
        self.document
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kv_version(&self) -> KvVersion {
        self.kv_version
    }

    pub fn mount(&self) -> &str {
        &self.mount
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn names_as_keys(&self) -> bool {
        self.names_as_keys
    }

    pub fn has_wildcard(&self) -> bool {
        self.path.contains('*')
    }

    /// True when the address denotes a directory of child secrets.
    pub fn is_multi_key(&self) -> bool {
        !self.document
            && (self.path.trim_end().ends_with('/') || self.has_wildcard() || self.names_as_keys)
    }
}

impl fmt::Display for SecretAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.kv_version)?;
        if let Some(version) = &self.version {
            write!(f, " @{}", version)?;
        }
        Ok(())
    }
}

/// One secret configuration as given on the command line:
/// `{"path": "secret/app/", "version": "3", "use-secret-names-as-keys": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretConfigSpec {
    pub path: String,

    #[serde(default, deserialize_with = "deserialize_version")]
    pub version: Option<String>,

    #[serde(
        default,
        rename = "use-secret-names-as-keys",
        deserialize_with = "deserialize_flag"
    )]
    pub names_as_keys: bool,
}

impl SecretConfigSpec {
    pub fn new(path: impl Into<String>, version: Option<String>, names_as_keys: bool) -> Self {
        Self {
            path: path.into(),
            version,
            names_as_keys,
        }
    }

    /// Parse one JSON configuration string.
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            SecretsEnvError::config(format!("invalid secret config '{}': {}", json, e))
        })
    }

    /// Bind this configuration to a store's addressing scheme.
    pub fn into_address(self, kv_version: KvVersion, mount: impl Into<String>) -> Result<SecretAddress> {
        Ok(SecretAddress::new(self.path)?
            .with_store(kv_version, mount)
            .with_version(self.version)
            .with_names_as_keys(self.names_as_keys))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionRepr {
    Number(u64),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlagRepr>::deserialize(deserializer)? {
        None => Ok(false),
        Some(FlagRepr::Bool(b)) => Ok(b),
        Some(FlagRepr::Text(s)) => parse_flag(&s).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a boolean, got '{}'", s))
        }),
    }
}

fn deserialize_version<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<VersionRepr>::deserialize(deserializer)? {
        None => None,
        Some(VersionRepr::Number(n)) => Some(n.to_string()),
        Some(VersionRepr::Text(s)) if s.trim().is_empty() => None,
        Some(VersionRepr::Text(s)) => Some(s),
    })
}

/// Boolean spellings accepted for flags given as strings.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim() {
        "" => Some(false),
        "1" | "t" | "T" | "true" | "TRUE" | "True" | "yes" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_rejected() {
        let err = SecretAddress::new("  ").unwrap_err();
        assert!(matches!(err, SecretsEnvError::Addressing(_)));
    }

    #[test]
    fn test_multi_key_markers() {
        assert!(SecretAddress::new("secret/app/").unwrap().is_multi_key());
        assert!(SecretAddress::new("secret/db*").unwrap().is_multi_key());
        assert!(
            SecretAddress::new("secret/app")
                .unwrap()
                .with_names_as_keys(true)
                .is_multi_key()
        );
        assert!(!SecretAddress::new("secret/app").unwrap().is_multi_key());
    }

    #[test]
    fn test_document_address_is_never_multi_key() {
        let address = SecretAddress::new("team/app/").unwrap().as_document();
        assert!(address.is_document());
        assert!(!address.is_multi_key());
    }

    #[test]
    fn test_blank_version_means_unpinned() {
        let address = SecretAddress::new("secret/app")
            .unwrap()
            .with_version(Some(" ".into()));
        assert_eq!(address.version(), None);
    }

    #[test]
    fn test_parse_config_with_string_flag() {
        let spec =
            SecretConfigSpec::parse(r#"{"path": "secret/app/", "use-secret-names-as-keys": "true"}"#)
                .unwrap();
        assert_eq!(spec.path, "secret/app/");
        assert!(spec.names_as_keys);
        assert_eq!(spec.version, None);
    }

    #[test]
    fn test_parse_config_with_numeric_version() {
        let spec = SecretConfigSpec::parse(r#"{"path": "secret/app", "version": 3}"#).unwrap();
        assert_eq!(spec.version.as_deref(), Some("3"));
        assert!(!spec.names_as_keys);
    }

    #[test]
    fn test_parse_config_rejects_garbage_flag() {
        let err = SecretConfigSpec::parse(r#"{"path": "a", "use-secret-names-as-keys": "maybe"}"#)
            .unwrap_err();
        assert!(matches!(err, SecretsEnvError::Config(_)));
    }

    #[test]
    fn test_into_address_rejects_empty_path() {
        let spec = SecretConfigSpec::new("", None, false);
        assert!(spec.into_address(KvVersion::V2, "secret/").is_err());
    }
}
