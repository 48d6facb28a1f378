//! Turning a [`SecretAddress`] into concrete store reads.
//!
//! Classification (`plan`) is pure and fails before any store call. Expansion
//! (`concrete_reads`) performs the listing for multi-key addresses.

use regex::Regex;
use tracing::{debug, warn};

use super::address::{KvVersion, SecretAddress};
use super::store::SecretStore;
use crate::error::{Result, SecretsEnvError};

const DATA_PREFIX: &str = "data";
const METADATA_PREFIX: &str = "metadata";

/// A compiled glob over key names, taken from the last path segment.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    raw: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compile a segment such as `db*`, `*_password` or `*token*`.
    ///
    /// A star may only lead or trail the segment.
    pub fn compile(segment: &str) -> Result<Self> {
        let literal = segment.trim_start_matches('*').trim_end_matches('*');
        if !segment.contains('*') || literal.contains('*') {
            return Err(SecretsEnvError::addressing(format!(
                "unsupported wildcard segment '{}': '*' may only lead or trail the last path segment",
                segment
            )));
        }

        let head = if segment.starts_with('*') { ".*" } else { "" };
        let tail = if segment.ends_with('*') && !literal.is_empty() {
            ".*"
        } else {
            ""
        };
        let expr = format!("^{}{}{}$", head, regex::escape(literal), tail);
        let regex = Regex::new(&expr)
            .map_err(|e| SecretsEnvError::addressing(format!("bad wildcard '{}': {}", segment, e)))?;

        Ok(Self {
            raw: segment.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Keep the matching keys, preserving listing order.
    pub fn filter(&self, keys: Vec<String>) -> Vec<String> {
        keys.into_iter().filter(|k| self.matches(k)).collect()
    }
}

/// How one address is read.
#[derive(Debug, Clone)]
pub enum ReadPlan {
    /// Read a single document, optionally at a pinned version.
    Document {
        path: String,
        version: Option<String>,
    },
    /// List `list_path`, then read every child of `parent` that survives the
    /// optional filter.
    Directory {
        parent: String,
        list_path: String,
        filter: Option<WildcardPattern>,
    },
}

/// One store read produced by expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcreteRead {
    /// Child key name for directory reads, `None` for a single document.
    pub key: Option<String>,
    pub path: String,
    pub version: Option<String>,
}

/// Trim surrounding whitespace and slashes.
pub fn sanitize_path(path: &str) -> &str {
    path.trim().trim_matches('/')
}

/// Route `path` through `<mount>/<api_prefix>/`. An empty mount leaves the
/// path as is.
pub fn prefixed_path(path: &str, mount: &str, api_prefix: &str) -> String {
    let path = sanitize_path(path);
    let mount = sanitize_path(mount);
    if mount.is_empty() {
        return path.to_string();
    }
    if path == mount {
        return format!("{}/{}", mount, api_prefix);
    }
    let rest = path
        .strip_prefix(mount)
        .and_then(|r| r.strip_prefix('/'))
        .unwrap_or(path);
    format!("{}/{}/{}", mount, api_prefix, rest)
}

fn read_path(address: &SecretAddress, path: &str) -> String {
    match address.kv_version() {
        KvVersion::V1 => sanitize_path(path).to_string(),
        KvVersion::V2 => prefixed_path(path, address.mount(), DATA_PREFIX),
    }
}

fn list_path(address: &SecretAddress, parent: &str) -> String {
    let base = match address.kv_version() {
        KvVersion::V1 => sanitize_path(parent).to_string(),
        KvVersion::V2 => prefixed_path(parent, address.mount(), METADATA_PREFIX),
    };
    format!("{}/", base)
}

/// Split a wildcard path into its parent directory and pattern.
fn split_wildcard(path: &str) -> Result<(String, WildcardPattern)> {
    let path = path.trim();
    let (parent, segment) = match path.rfind('/') {
        Some(idx) => (&path[..=idx], &path[idx + 1..]),
        None => ("", path),
    };
    if parent.contains('*') {
        return Err(SecretsEnvError::addressing(format!(
            "wildcard in '{}' must be in the last path segment",
            path
        )));
    }
    Ok((parent.to_string(), WildcardPattern::compile(segment)?))
}

/// Classify an address without touching the store.
pub fn plan(address: &SecretAddress) -> Result<ReadPlan> {
    if !address.is_multi_key() {
        let version = match (address.kv_version(), address.version()) {
            (KvVersion::V1, Some(v)) => {
                warn!(path = %address.path(), version = v, "version pin ignored on a v1 store");
                None
            }
            (_, v) => v.map(str::to_string),
        };
        let path = if address.is_document() {
            address.path().trim().to_string()
        } else {
            read_path(address, address.path())
        };
        return Ok(ReadPlan::Document { path, version });
    }

    if let Some(v) = address.version() {
        return Err(SecretsEnvError::addressing(format!(
            "version '{}' cannot be pinned on multi-key address '{}'",
            v,
            address.path()
        )));
    }

    let (parent, filter) = if address.has_wildcard() {
        let (parent, pattern) = split_wildcard(address.path())?;
        (parent, Some(pattern))
    } else {
        let trimmed = address.path().trim();
        let parent = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };
        (parent, None)
    };

    Ok(ReadPlan::Directory {
        list_path: list_path(address, &parent),
        parent,
        filter,
    })
}

/// Compute every store read needed for `address`, listing directories.
pub fn concrete_reads<S>(store: &S, address: &SecretAddress) -> Result<Vec<ConcreteRead>>
where
    S: SecretStore + ?Sized,
{
    let (parent, list_path, filter) = match plan(address)? {
        ReadPlan::Document { path, version } => {
            return Ok(vec![ConcreteRead {
                key: None,
                path,
                version,
            }]);
        }
        ReadPlan::Directory {
            parent,
            list_path,
            filter,
        } => (parent, list_path, filter),
    };

    let listed = store.list(&list_path)?;
    if listed.is_empty() {
        return Err(SecretsEnvError::not_found(format!(
            "no keys found for list operation at: {}, check the path",
            list_path
        )));
    }
    debug!(path = %list_path, count = listed.len(), "listed secret keys");

    let keys = match &filter {
        Some(pattern) => {
            let matched = pattern.filter(listed);
            if matched.is_empty() {
                warn!(
                    path = %list_path,
                    pattern = pattern.as_str(),
                    "no secret keys matched the wildcard"
                );
            }
            matched
        }
        None => listed,
    };

    let parent = sanitize_path(&parent);
    let mut reads = Vec::with_capacity(keys.len());
    for key in keys {
        if key.ends_with('/') {
            warn!(path = %list_path, key = %key, "skipping subtree, nested paths are not read");
            continue;
        }
        let child = if parent.is_empty() {
            key.clone()
        } else {
            format!("{}/{}", parent, key)
        };
        reads.push(ConcreteRead {
            path: read_path(address, &child),
            key: Some(key),
            version: None,
        });
    }
    Ok(reads)
}
