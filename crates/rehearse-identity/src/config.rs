use serde::{Deserialize, Serialize};
use std::fmt;

/// Signature algorithm used by the identity provider's session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionAlgorithm {
    /// HMAC-SHA256 with a shared secret.
    #[default]
    #[serde(rename = "HS256")]
    Hs256,
    /// RSA-SHA256 with the provider's PEM-encoded public key.
    #[serde(rename = "RS256")]
    Rs256,
}

fn default_leeway_seconds() -> u64 {
    60
}

/// How incoming session tokens are verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub algorithm: SessionAlgorithm,
    /// Shared secret for `HS256`.
    #[serde(default, skip_serializing)]
    pub secret: String,
    /// Path to the PEM public key for `RS256`.
    #[serde(default)]
    pub public_key_path: Option<String>,
    /// Expected `iss` claim. Not checked when unset.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Clock skew tolerated on `exp`/`nbf`, in seconds. Default: 60.
    #[serde(default = "default_leeway_seconds")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: SessionAlgorithm::default(),
            secret: String::new(),
            public_key_path: None,
            issuer: None,
            leeway_seconds: default_leeway_seconds(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("algorithm", &self.algorithm)
            .field("secret", &"[REDACTED]")
            .field("public_key_path", &self.public_key_path)
            .field("issuer", &self.issuer)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl AuthConfig {
    /// Shared-secret configuration, mostly for development and tests.
    pub fn hs256(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }
}
