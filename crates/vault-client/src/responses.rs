use serde::Deserialize;
use serde_json::{Map, Value};

/// The envelope of a successful `GET /v1/{mount}/data/{path}` request
/// against a KV version 2 secrets engine.
#[derive(Debug, Clone, Deserialize)]
pub struct KvV2Response {
    pub data: KvV2Data,
}

/// The versioned payload: the secret's key/value pairs plus metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct KvV2Data {
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: Option<KvV2Metadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KvV2Metadata {
    pub version: Option<u64>,
    #[serde(default)]
    pub destroyed: bool,
}

/// The body Vault sends alongside non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaultErrorResponse {
    #[serde(default)]
    pub errors: Vec<String>,
}

impl VaultErrorResponse {
    /// Parses an error body, tolerating bodies that are not JSON at all.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|_| Self {
            errors: if body.trim().is_empty() {
                Vec::new()
            } else {
                vec![body.trim().to_string()]
            },
        })
    }

    pub fn message(&self) -> String {
        if self.errors.is_empty() {
            "no error details".to_string()
        } else {
            self.errors.join("; ")
        }
    }
}
