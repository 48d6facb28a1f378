//! Secret addressing, retrieval and flattening.

pub mod address;
pub mod aggregate;
pub mod assemble;
pub mod path;
pub mod providers;
pub mod store;

use serde_json::Value;
use std::collections::BTreeMap;

/// Flat secret name to value map produced by retrieval.
pub type SecretMap = BTreeMap<String, Value>;

pub use address::{KvVersion, SecretAddress, SecretConfigSpec};
pub use aggregate::resolve_secrets;
pub use assemble::resolve_secret;
pub use providers::Store;
pub use store::{MemoryStore, RawDocument, SecretStore, StoreCall};
