//! Flattening store reads for one address into a [`SecretMap`].

use serde_json::Value;
use tracing::debug;

use super::SecretMap;
use super::address::SecretAddress;
use super::path::{ConcreteRead, concrete_reads};
use super::store::{RawDocument, SecretStore};
use crate::error::{Result, SecretsEnvError};

/// Field holding the value of a names-as-keys document.
pub const VALUE_FIELD: &str = "value";

/// Strip a KV v2 `data` envelope when present.
pub fn unwrap_envelope(mut document: RawDocument) -> RawDocument {
    match document.remove("data") {
        Some(Value::Object(inner)) => inner,
        Some(other) => {
            document.insert("data".to_string(), other);
            document
        }
        None => document,
    }
}

/// The single value of a names-as-keys document: `value` when present,
/// otherwise the document's only field.
fn single_value(mut document: RawDocument, path: &str) -> Result<Value> {
    if let Some(value) = document.remove(VALUE_FIELD) {
        return Ok(value);
    }
    if document.len() == 1
        && let Some((_, value)) = document.into_iter().next()
    {
        return Ok(value);
    }
    Err(SecretsEnvError::not_found(format!(
        "no single value at {}: expected a '{}' field",
        path, VALUE_FIELD
    )))
}

fn read_document<S>(store: &S, read: &ConcreteRead) -> Result<RawDocument>
where
    S: SecretStore + ?Sized,
{
    debug!(store = store.kind(), path = %read.path, version = ?read.version, "reading secret");
    let document = match &read.version {
        Some(version) => store.read_versioned(&read.path, version)?,
        None => store.read(&read.path)?,
    };
    Ok(unwrap_envelope(document))
}

/// Resolve one address into a flat name to value map.
///
/// Directory reads merge every child document's fields, or in names-as-keys
/// mode store each child's single value under the child key name. Later
/// children overwrite earlier ones on collision.
pub fn resolve_secret<S>(store: &S, address: &SecretAddress) -> Result<SecretMap>
where
    S: SecretStore + ?Sized,
{
    let reads = concrete_reads(store, address)?;
    let mut secrets = SecretMap::new();

    for read in &reads {
        let document = read_document(store, read)?;
        match &read.key {
            Some(key) if address.names_as_keys() => {
                secrets.insert(key.clone(), single_value(document, &read.path)?);
            }
            _ => secrets.extend(document),
        }
    }

    debug!(address = %address, keys = secrets.len(), "assembled secret");
    Ok(secrets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> RawDocument {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_unwrap_envelope() {
        let unwrapped = unwrap_envelope(doc(json!({"data": {"a": "1"}, "metadata": {"version": 2}})));
        assert_eq!(Value::Object(unwrapped), json!({"a": "1"}));
    }

    #[test]
    fn test_scalar_data_field_is_kept() {
        let document = doc(json!({"data": "plain", "b": 2}));
        let unwrapped = unwrap_envelope(document.clone());
        assert_eq!(unwrapped, document);
    }

    #[test]
    fn test_single_value_rules() {
        assert_eq!(single_value(doc(json!({"value": "x", "other": 1})), "p").unwrap(), json!("x"));
        assert_eq!(single_value(doc(json!({"token": 7})), "p").unwrap(), json!(7));
        let err = single_value(doc(json!({"a": 1, "b": 2})), "p").unwrap_err();
        assert!(err.is_not_found());
    }
}
