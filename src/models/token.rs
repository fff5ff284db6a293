use serde::{Deserialize, Serialize};

/// Bearer token issued by a provider's client-credentials endpoint.
///
/// Cached per provider under a fixed TTL window; `expires_in` is the
/// provider's own lifetime hint and is deliberately not used to size the
/// cache window (see `TokenService`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl CachedToken {
    /// Value for an `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}
