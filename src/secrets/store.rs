//! The read-only capability the resolution engine needs from a secret backend.

use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{Result, SecretsEnvError};

/// One document as returned by a store read: an untyped string-keyed map,
/// possibly wrapping its fields in a nested `data` map (KV v2 envelope).
pub type RawDocument = Map<String, Value>;

/// A key/value secret store addressed by concrete paths.
///
/// Implementations perform blocking calls and return fully materialised
/// results. Timeouts and cancellation are theirs to handle; the engine treats
/// any failure as opaque and propagates it.
pub trait SecretStore {
    /// Short backend name used in log fields ("vault", "aws", "memory").
    fn kind(&self) -> &str;

    /// Read one document at `path`.
    fn read(&self, path: &str) -> Result<RawDocument>;

    /// List the child key names directly under `path`. Subtrees end in `/`.
    fn list(&self, path: &str) -> Result<Vec<String>>;

    /// Read a specific historical version of the document at `path`.
    fn read_versioned(&self, path: &str, version: &str) -> Result<RawDocument>;
}

impl<S: SecretStore + ?Sized> SecretStore for Box<S> {
    fn kind(&self) -> &str {
        (**self).kind()
    }

    fn read(&self, path: &str) -> Result<RawDocument> {
        (**self).read(path)
    }

    fn list(&self, path: &str) -> Result<Vec<String>> {
        (**self).list(path)
    }

    fn read_versioned(&self, path: &str, version: &str) -> Result<RawDocument> {
        (**self).read_versioned(path, version)
    }
}

/// A store operation recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Read(String),
    List(String),
    ReadVersioned(String, String),
}

/// In-memory store keyed by concrete path.
///
/// Used as the test double for the engine and handy for dry runs. Every call
/// is recorded so tests can assert which reads happened.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: HashMap<String, Value>,
    versions: HashMap<(String, String), Value>,
    listings: HashMap<String, Vec<String>>,
    calls: RefCell<Vec<StoreCall>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document at a concrete path.
    pub fn with_document(mut self, path: impl Into<String>, document: Value) -> Self {
        self.documents.insert(path.into(), document);
        self
    }

    /// Store a historical version of a document.
    pub fn with_version(
        mut self,
        path: impl Into<String>,
        version: impl Into<String>,
        document: Value,
    ) -> Self {
        self.versions.insert((path.into(), version.into()), document);
        self
    }

    /// Register the keys returned when `path` is listed.
    pub fn with_listing<I, K>(mut self, path: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.listings
            .insert(path.into(), keys.into_iter().map(Into::into).collect());
        self
    }

    /// Operations performed so far, in call order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: StoreCall) {
        self.calls.borrow_mut().push(call);
    }

    fn as_document(path: &str, value: &Value) -> Result<RawDocument> {
        match value {
            Value::Object(map) => Ok(map.clone()),
            _ => Err(SecretsEnvError::transport(path, "document is not a JSON object")),
        }
    }
}

impl SecretStore for MemoryStore {
    fn kind(&self) -> &str {
        "memory"
    }

    fn read(&self, path: &str) -> Result<RawDocument> {
        self.record(StoreCall::Read(path.to_string()));
        match self.documents.get(path) {
            Some(value) => Self::as_document(path, value),
            None => Err(SecretsEnvError::not_found(format!(
                "secret path not found: {}",
                path
            ))),
        }
    }

    fn list(&self, path: &str) -> Result<Vec<String>> {
        self.record(StoreCall::List(path.to_string()));
        self.listings.get(path).cloned().ok_or_else(|| {
            SecretsEnvError::not_found(format!("no value found at: {}, check the path", path))
        })
    }

    fn read_versioned(&self, path: &str, version: &str) -> Result<RawDocument> {
        self.record(StoreCall::ReadVersioned(
            path.to_string(),
            version.to_string(),
        ));
        match self.versions.get(&(path.to_string(), version.to_string())) {
            Some(value) => Self::as_document(path, value),
            None => Err(SecretsEnvError::not_found(format!(
                "version {} of secret {} not found",
                version, path
            ))),
        }
    }
}
