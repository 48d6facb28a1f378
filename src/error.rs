//! Unified error type for secrets-env.
//!
//! All public APIs return `Result<T, SecretsEnvError>`. The first four
//! categories cover the resolution pipeline (addressing, lookup, transport,
//! reference resolution); the rest are ambient failures from configuration,
//! I/O and the cloud SDKs.

use std::fmt;

/// The unified error type for all secrets-env operations.
#[derive(Debug)]
pub enum SecretsEnvError {
    // ── Resolution pipeline ────────────────────────────────────────────
    /// The secret address is malformed (empty path, bad wildcard).
    /// Raised before any store call is made.
    Addressing(String),

    /// A listing returned no keys, or a read returned no data.
    NotFound(String),

    /// The underlying store call failed (network, auth, permission).
    Transport { path: String, message: String },

    /// An explicit `secret:`/`vault:` reference names a key that was not
    /// retrieved.
    Reference(String),

    // ── I/O & serialization ────────────────────────────────────────────
    /// Filesystem or I/O operation failed.
    Io(std::io::Error),

    /// JSON serialization/deserialization error.
    Json(serde_json::Error),

    /// Config file or flag validation error.
    Config(String),

    // ── Provider-specific ──────────────────────────────────────────────
    /// An error originating from a cloud secrets provider (AWS, GCP).
    Provider { provider: String, message: String },

    /// Operation is not supported by this store.
    Unsupported(String),

    /// User input validation failed.
    Validation(String),

    // ── Catch-all ──────────────────────────────────────────────────────
    /// Any other error.
    Other(String),
}

// ── Display ────────────────────────────────────────────────────────────

impl fmt::Display for SecretsEnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretsEnvError::Addressing(msg) => write!(f, "invalid secret address: {}", msg),
            SecretsEnvError::NotFound(msg) => write!(f, "{}", msg),
            SecretsEnvError::Transport { path, message } => {
                write!(f, "store request for '{}' failed: {}", path, message)
            }
            SecretsEnvError::Reference(key) => {
                write!(f, "env var key: {} not found in secrets keys", key)
            }
            SecretsEnvError::Io(e) => write!(f, "{}", e),
            SecretsEnvError::Json(e) => write!(f, "JSON error: {}", e),
            SecretsEnvError::Config(msg) => write!(f, "config error: {}", msg),
            SecretsEnvError::Provider { provider, message } => {
                write!(f, "provider '{}': {}", provider, message)
            }
            SecretsEnvError::Unsupported(msg) => write!(f, "unsupported: {}", msg),
            SecretsEnvError::Validation(msg) => write!(f, "{}", msg),
            SecretsEnvError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SecretsEnvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SecretsEnvError::Io(e) => Some(e),
            SecretsEnvError::Json(e) => Some(e),
            _ => None,
        }
    }
}

// ── From implementations for common error types ────────────────────────

impl From<std::io::Error> for SecretsEnvError {
    fn from(e: std::io::Error) -> Self {
        SecretsEnvError::Io(e)
    }
}

impl From<serde_json::Error> for SecretsEnvError {
    fn from(e: serde_json::Error) -> Self {
        SecretsEnvError::Json(e)
    }
}


// ── Convenience constructors ───────────────────────────────────────────

impl SecretsEnvError {
    /// Create an addressing error.
    pub fn addressing(message: impl Into<String>) -> Self {
        SecretsEnvError::Addressing(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        SecretsEnvError::NotFound(message.into())
    }

    /// Create a transport error carrying the path that was requested.
    pub fn transport(path: impl Into<String>, message: impl fmt::Display) -> Self {
        SecretsEnvError::Transport {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a reference resolution error for a missing key.
    pub fn reference(key: impl Into<String>) -> Self {
        SecretsEnvError::Reference(key.into())
    }

    /// Create a provider-specific error.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        SecretsEnvError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        SecretsEnvError::Unsupported(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        SecretsEnvError::Validation(message.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        SecretsEnvError::Config(message.into())
    }

    /// True for lookups that found nothing, as opposed to failed calls.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SecretsEnvError::NotFound(_))
    }

    /// Failed read of a named secret in a cloud store: `NotFound` when the
    /// store reported a missing secret, otherwise a transport error that
    /// keeps the name and the readable cause.
    pub fn secret_read(name: &str, not_found: bool, detail: impl Into<String>) -> Self {
        if not_found {
            SecretsEnvError::NotFound(format!("secret not found: {}", name))
        } else {
            SecretsEnvError::transport(name, detail.into())
        }
    }

    /// Create a provider error for GCP, translating common Secret Manager
    /// errors into user-friendly messages.
    pub fn gcp(e: impl fmt::Display) -> Self {
        SecretsEnvError::Provider {
            provider: "gcp".to_string(),
            message: gcp_message(&e.to_string()),
        }
    }
}

/// Translate common Secrets Manager error codes into user-friendly messages.
pub fn aws_message(msg: &str) -> String {
    let friendly = if msg.contains("ResourceNotFoundException") {
        "Secret not found (may have been deleted)"
    } else if msg.contains("AccessDeniedException") {
        "Access denied (check IAM permissions)"
    } else if msg.contains("InvalidParameterException") {
        "Invalid parameter"
    } else if msg.contains("InvalidRequestException") {
        "Invalid request"
    } else if msg.contains("DecryptionFailure") {
        "Decryption failed (KMS key issue)"
    } else if msg.contains("InternalServiceError") {
        "AWS internal error (try again later)"
    } else {
        return msg.to_string();
    };
    format!("{} ({})", friendly, msg)
}

/// Translate common Secret Manager status codes into user-friendly messages.
pub fn gcp_message(msg: &str) -> String {
    let friendly = if msg.contains("NOT_FOUND") || msg.contains("notFound") {
        "Secret not found"
    } else if msg.contains("PERMISSION_DENIED") || msg.contains("permissionDenied") {
        "Permission denied (check roles/secretmanager.secretAccessor)"
    } else if msg.contains("UNAUTHENTICATED") || msg.contains("unauthenticated") {
        "Not authenticated (run 'gcloud auth application-default login')"
    } else if msg.contains("INVALID_ARGUMENT") || msg.contains("invalidArgument") {
        "Invalid argument"
    } else if msg.contains("FAILED_PRECONDITION") || msg.contains("failedPrecondition") {
        "Failed precondition (secret version may be disabled or destroyed)"
    } else if msg.contains("UNAVAILABLE") {
        "GCP service unavailable (try again later)"
    } else {
        return msg.to_string();
    };
    format!("{} ({})", friendly, msg)
}

/// Convenience type alias for Results using SecretsEnvError.
pub type Result<T> = std::result::Result<T, SecretsEnvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_error_names_the_key() {
        let err = SecretsEnvError::reference("db_password");
        assert_eq!(
            err.to_string(),
            "env var key: db_password not found in secrets keys"
        );
    }

    #[test]
    fn test_transport_error_keeps_path() {
        let err = SecretsEnvError::transport("secret/data/app", "connection refused");
        assert!(err.to_string().contains("secret/data/app"));
        assert!(err.to_string().contains("connection refused"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_aws_message_translation() {
        assert_eq!(
            aws_message("service error: AccessDeniedException: nope"),
            "Access denied (check IAM permissions) (service error: AccessDeniedException: nope)"
        );
        assert_eq!(aws_message("dispatch failure"), "dispatch failure");
    }

    #[test]
    fn test_secret_read_error_kinds() {
        let missing = SecretsEnvError::secret_read("prod/app", true, "ignored");
        assert!(missing.is_not_found());
        assert!(missing.to_string().contains("prod/app"));

        let failed = SecretsEnvError::secret_read("prod/app", false, "timeout");
        match failed {
            SecretsEnvError::Transport { path, message } => {
                assert_eq!(path, "prod/app");
                assert_eq!(message, "timeout");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_gcp_error_passthrough() {
        let err = SecretsEnvError::gcp("something odd");
        assert_eq!(err.to_string(), "provider 'gcp': something odd");
    }
}
