//! Merging resolved secrets into a child process environment.
//!
//! Ambient values of the form `secret:<key>` or `vault:<key>` are replaced by
//! the named secret. When no such reference exists anywhere, every secret is
//! injected under its upper-cased name instead. The two modes never mix.

use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SecretsEnvError};
use crate::secrets::SecretMap;

/// Value prefixes that mark an explicit secret reference.
pub const REFERENCE_PREFIXES: [&str; 2] = ["vault:", "secret:"];

/// Escape marker: `>>secret:x` is passed on as the literal `secret:x`.
pub const ESCAPE_PREFIX: &str = ">>";

/// Secret-store client settings that are never forwarded to the child.
pub const SANITIZED_VARIABLES: [&str; 18] = [
    "VAULT_TOKEN",
    "VAULT_ADDR",
    "VAULT_CACERT",
    "VAULT_CAPATH",
    "VAULT_CLIENT_CERT",
    "VAULT_CLIENT_KEY",
    "VAULT_CLIENT_TIMEOUT",
    "VAULT_CLUSTER_ADDR",
    "VAULT_MAX_RETRIES",
    "VAULT_REDIRECT_ADDR",
    "VAULT_SKIP_VERIFY",
    "VAULT_TLS_SERVER_NAME",
    "VAULT_CLI_NO_COLOR",
    "VAULT_RATE_LIMIT",
    "VAULT_NAMESPACE",
    "VAULT_MFA",
    "VAULT_ROLE",
    "VAULT_PATH",
];

pub fn is_sanitized(name: &str) -> bool {
    SANITIZED_VARIABLES.contains(&name)
}

/// The `name=value` entries handed to the launched command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizedEnvironment {
    entries: Vec<String>,
}

impl SanitizedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry unless its name is on the denylist.
    pub fn push(&mut self, name: &str, value: &str) {
        if is_sanitized(name) {
            debug!(name, "dropping secret-store variable from child environment");
            return;
        }
        self.entries.push(format!("{}={}", name, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    /// Entries split back into name and value.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|e| e.split_once('=').unwrap_or((e.as_str(), "")))
    }
}

/// Render a secret value as environment text. Strings are used raw, `null`
/// becomes empty and nested structures are written as JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

enum Entry<'a> {
    Plain { name: &'a str, value: &'a str },
    Reference { name: &'a str, key: &'a str },
}

fn classify(entry: &str) -> Entry<'_> {
    let (name, value) = entry.split_once('=').unwrap_or((entry, ""));

    if let Some(rest) = value.strip_prefix(ESCAPE_PREFIX)
        && REFERENCE_PREFIXES.iter().any(|p| rest.starts_with(p))
    {
        return Entry::Plain { name, value: rest };
    }

    for prefix in REFERENCE_PREFIXES {
        if let Some(key) = value.strip_prefix(prefix) {
            return Entry::Reference { name, key };
        }
    }
    Entry::Plain { name, value }
}

/// Combine `secrets` with the ambient `name=value` entries.
///
/// Output order: plain ambient entries, then resolved references, both in
/// ambient order, then bulk entries sorted by key. A reference to a missing
/// key fails the whole call.
pub fn inject_environment<I, S>(secrets: &SecretMap, ambient: I) -> Result<SanitizedEnvironment>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ambient: Vec<S> = ambient.into_iter().collect();

    let mut plain = Vec::new();
    let mut resolved = Vec::new();
    for entry in &ambient {
        match classify(entry.as_ref()) {
            Entry::Plain { name, value } => plain.push((name, value.to_string())),
            Entry::Reference { name, key } => {
                let value = secrets
                    .get(key)
                    .ok_or_else(|| SecretsEnvError::reference(key))?;
                resolved.push((name, render_value(value)));
            }
        }
    }

    let mut env = SanitizedEnvironment::new();
    for (name, value) in plain.iter().chain(resolved.iter()) {
        env.push(name, value);
    }

    if resolved.is_empty() {
        debug!(count = secrets.len(), "no explicit references, injecting all secrets");
        for (key, value) in secrets {
            env.push(&key.to_uppercase(), &render_value(value));
        }
    } else {
        debug!(count = resolved.len(), "resolved explicit secret references");
    }

    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn secrets(value: Value) -> SecretMap {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_render_value() {
        assert_eq!(render_value(&json!("abc")), "abc");
        assert_eq!(render_value(&json!(8200)), "8200");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!(null)), "");
        assert_eq!(render_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_escape_only_applies_to_reference_syntax() {
        let env = inject_environment(
            &secrets(json!({"x": "resolved"})),
            ["A=>>secret:x", "B=>>other", "C=secret:x"],
        )
        .unwrap();
        assert_eq!(env.as_slice(), ["A=secret:x", "B=>>other", "C=resolved"]);
    }

    #[test]
    fn test_missing_reference_fails() {
        let err = inject_environment(&secrets(json!({})), ["DB=vault:db_password"]).unwrap_err();
        assert!(matches!(err, SecretsEnvError::Reference(ref k) if k == "db_password"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let env = inject_environment(&secrets(json!({})), ["OPTS=a=b"]).unwrap();
        assert_eq!(env.as_slice(), ["OPTS=a=b"]);
        assert_eq!(env.pairs().collect::<Vec<_>>(), vec![("OPTS", "a=b")]);
    }

    #[test]
    fn test_bulk_keys_are_filtered_too() {
        let env = inject_environment(&secrets(json!({"vault_token": "t", "k": "v"})), Vec::<String>::new())
            .unwrap();
        assert_eq!(env.as_slice(), ["K=v"]);
    }
}
