//! Secret resolution against the in-memory store.

use secrets_env::secrets::StoreCall;
use secrets_env::{KvVersion, MemoryStore, SecretAddress, SecretsEnvError, resolve_secret, resolve_secrets};
use serde_json::json;

fn v2(path: &str) -> SecretAddress {
    SecretAddress::new(path)
        .unwrap()
        .with_store(KvVersion::V2, "secret/")
}

#[test]
fn test_plain_document_is_returned_unchanged() {
    let store = MemoryStore::new().with_document("kv/app", json!({"user": "admin", "port": 5432}));
    let secrets = resolve_secret(&store, &SecretAddress::new("kv/app").unwrap()).unwrap();

    assert_eq!(secrets.len(), 2);
    assert_eq!(secrets["user"], json!("admin"));
    assert_eq!(secrets["port"], json!(5432));
}

#[test]
fn test_versioned_envelope_is_unwrapped() {
    let store = MemoryStore::new().with_document(
        "secret/data/app",
        json!({"data": {"user": "admin"}, "metadata": {"version": 3}}),
    );
    let secrets = resolve_secret(&store, &v2("secret/app")).unwrap();

    assert_eq!(secrets.len(), 1);
    assert_eq!(secrets["user"], json!("admin"));
    assert!(!secrets.contains_key("metadata"));
}

#[test]
fn test_resolution_is_idempotent() {
    let store = MemoryStore::new()
        .with_listing("kv/team/", ["a", "b"])
        .with_document("kv/team/a", json!({"x": 1}))
        .with_document("kv/team/b", json!({"y": 2}));
    let address = SecretAddress::new("kv/team/").unwrap();

    let first = resolve_secret(&store, &address).unwrap();
    let second = resolve_secret(&store, &address).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_wildcard_filters_listed_keys() {
    let store = MemoryStore::new()
        .with_listing("secrets/", ["db_user", "db_pass", "other"])
        .with_document("secrets/db_user", json!({"username": "admin"}))
        .with_document("secrets/db_pass", json!({"password": "s3cr3t"}))
        .with_document("secrets/other", json!({"unrelated": true}));

    let secrets = resolve_secret(&store, &SecretAddress::new("secrets/db*").unwrap()).unwrap();

    assert_eq!(secrets["username"], json!("admin"));
    assert_eq!(secrets["password"], json!("s3cr3t"));
    assert!(!secrets.contains_key("unrelated"));
    assert_eq!(
        store.calls(),
        vec![
            StoreCall::List("secrets/".into()),
            StoreCall::Read("secrets/db_user".into()),
            StoreCall::Read("secrets/db_pass".into()),
        ]
    );
}

#[test]
fn test_empty_listing_fails_before_any_read() {
    let store = MemoryStore::new().with_listing("kv/empty/", Vec::<String>::new());
    let err = resolve_secret(&store, &SecretAddress::new("kv/empty/").unwrap()).unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("no keys found"));
    assert_eq!(store.calls(), vec![StoreCall::List("kv/empty/".into())]);
}

#[test]
fn test_names_as_keys_uses_child_names() {
    let store = MemoryStore::new()
        .with_listing("secret/metadata/service/", ["API", "DATABASE_URL", "nested/"])
        .with_document(
            "secret/data/service/API",
            json!({"data": {"value": "qwerty1234"}, "metadata": {"version": 1}}),
        )
        .with_document(
            "secret/data/service/DATABASE_URL",
            json!({"data": {"value": "http://127.0.0.1:3306"}, "metadata": {"version": 4}}),
        );

    let address = v2("secret/service").with_names_as_keys(true);
    let secrets = resolve_secret(&store, &address).unwrap();

    assert_eq!(secrets.len(), 2);
    assert_eq!(secrets["API"], json!("qwerty1234"));
    assert_eq!(secrets["DATABASE_URL"], json!("http://127.0.0.1:3306"));
}

#[test]
fn test_directory_merges_document_fields() {
    let store = MemoryStore::new()
        .with_listing("secret/metadata/service/", ["app", "database"])
        .with_document(
            "secret/data/service/app",
            json!({"data": {"API_KEY": "qwerty1234"}}),
        )
        .with_document(
            "secret/data/service/database",
            json!({"data": {"USER_NAME": "admin", "PASSWORD": "s3cr3t"}}),
        );

    let secrets = resolve_secret(&store, &v2("secret/service/")).unwrap();

    assert_eq!(secrets.len(), 3);
    assert!(!secrets.contains_key("app"));
    assert_eq!(secrets["PASSWORD"], json!("s3cr3t"));
}

#[test]
fn test_pinned_version_uses_versioned_read() {
    let store = MemoryStore::new().with_version(
        "secret/data/app",
        "3",
        json!({"data": {"user": "old-admin"}, "metadata": {"version": 3}}),
    );
    let address = v2("secret/app").with_version(Some("3".into()));
    let secrets = resolve_secret(&store, &address).unwrap();

    assert_eq!(secrets["user"], json!("old-admin"));
    assert_eq!(
        store.calls(),
        vec![StoreCall::ReadVersioned("secret/data/app".into(), "3".into())]
    );
}

#[test]
fn test_pinned_version_on_directory_fails_without_store_calls() {
    let store = MemoryStore::new();
    let address = v2("secret/app/").with_version(Some("3".into()));
    let err = resolve_secret(&store, &address).unwrap_err();

    assert!(matches!(err, SecretsEnvError::Addressing(_)));
    assert!(store.calls().is_empty());
}

#[test]
fn test_aggregation_later_configuration_wins() {
    let store = MemoryStore::new()
        .with_document("kv/a", json!({"k": "from-a", "a_only": "1"}))
        .with_document("kv/b", json!({"k": "from-b", "b_only": "2"}));
    let addresses = [
        SecretAddress::new("kv/a").unwrap(),
        SecretAddress::new("kv/b").unwrap(),
    ];

    let merged = resolve_secrets(&store, &addresses).unwrap();
    assert_eq!(merged["k"], json!("from-b"));
    assert_eq!(merged.len(), 3);
}

#[test]
fn test_listing_error_is_propagated() {
    let store = MemoryStore::new();
    let err = resolve_secrets(&store, &[SecretAddress::new("kv/missing/").unwrap()]).unwrap_err();
    assert!(err.is_not_found());
}
