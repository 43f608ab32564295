use serde::{Deserialize, Serialize};
use std::fmt;

/// Public OpenAI REST base URL.
pub const DEFAULT_REALTIME_BASE_URL: &str = "https://api.openai.com/v1";

fn default_base_url() -> String {
    DEFAULT_REALTIME_BASE_URL.to_string()
}

fn default_model() -> String {
    "gpt-realtime".to_string()
}

fn default_voice() -> String {
    "cedar".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Settings for minting realtime voice session credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Server-side API key. Never sent to the browser.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Output voice of the interviewer.
    #[serde(default = "default_voice")]
    pub voice: String,
    /// File holding replacement interviewer instructions. The embedded
    /// prompt is used when unset.
    #[serde(default)]
    pub instructions_path: Option<String>,
    /// Upstream request timeout in seconds. Default: 30.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            voice: default_voice(),
            instructions_path: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl fmt::Debug for RealtimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("instructions_path", &self.instructions_path)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl RealtimeConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }
}
