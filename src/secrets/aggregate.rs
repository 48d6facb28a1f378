use tracing::info;

use super::SecretMap;
use super::address::SecretAddress;
use super::assemble::resolve_secret;
use super::store::SecretStore;
use crate::error::Result;

/// Resolve every address in order and merge the results.
///
/// Later addresses override earlier ones on key collision. The first failure
/// aborts the whole run and nothing gathered so far is returned.
pub fn resolve_secrets<S>(store: &S, addresses: &[SecretAddress]) -> Result<SecretMap>
where
    S: SecretStore + ?Sized,
{
    let mut merged = SecretMap::new();
    for address in addresses {
        let secrets = resolve_secret(store, address)?;
        info!(address = %address, keys = secrets.len(), "retrieved secrets");
        merged.extend(secrets);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_later_address_wins() {
        let store = MemoryStore::new()
            .with_document("kv/a", json!({"k": "from-a", "only_a": 1}))
            .with_document("kv/b", json!({"k": "from-b"}));
        let addresses = vec![
            SecretAddress::new("kv/a").unwrap(),
            SecretAddress::new("kv/b").unwrap(),
        ];
        let merged = resolve_secrets(&store, &addresses).unwrap();
        assert_eq!(merged["k"], json!("from-b"));
        assert_eq!(merged["only_a"], json!(1));
    }

    #[test]
    fn test_failure_discards_partial_results() {
        let store = MemoryStore::new().with_document("kv/a", json!({"k": "v"}));
        let addresses = vec![
            SecretAddress::new("kv/a").unwrap(),
            SecretAddress::new("kv/missing").unwrap(),
        ];
        assert!(resolve_secrets(&store, &addresses).unwrap_err().is_not_found());
    }
}
