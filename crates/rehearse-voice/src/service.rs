use crate::config::RealtimeConfig;
use crate::error::VoiceError;
use crate::prompt::load_instructions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Upstream error bodies are cut to this many characters before logging.
const MAX_UPSTREAM_ERROR_CHARS: usize = 512;

/// Body of `POST /realtime/client_secrets`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientSecretRequest {
    pub session: SessionConfig,
}

/// The fixed session every minted credential is bound to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub model: String,
    pub audio: AudioConfig,
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioConfig {
    pub output: AudioOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioOutput {
    pub voice: String,
}

#[derive(Deserialize)]
struct ClientSecretResponse {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
}

/// An ephemeral credential the browser uses to open its own voice session.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientSecret {
    pub value: String,
    /// Unix seconds, when the upstream reports it.
    pub expires_at: Option<i64>,
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecret")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Mints short-lived realtime credentials on behalf of signed-in users.
#[derive(Debug)]
pub struct RealtimeService {
    config: RealtimeConfig,
    instructions: String,
    client: reqwest::Client,
}

impl RealtimeService {
    /// Builds the service, loading instructions and the HTTP client once.
    ///
    /// # Errors
    ///
    /// Returns an error if the instructions file cannot be read or the HTTP
    /// client cannot be built.
    pub fn new(config: RealtimeConfig) -> Result<Self, VoiceError> {
        let instructions = load_instructions(config.instructions_path.as_deref())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            config,
            instructions,
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/realtime/client_secrets",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// The session configuration forwarded upstream.
    pub fn session_request(&self) -> ClientSecretRequest {
        ClientSecretRequest {
            session: SessionConfig {
                kind: "realtime",
                model: self.config.model.clone(),
                audio: AudioConfig {
                    output: AudioOutput {
                        voice: self.config.voice.clone(),
                    },
                },
                instructions: self.instructions.clone(),
            },
        }
    }

    /// Requests one ephemeral client secret. No retries, no caching.
    pub async fn mint_client_secret(&self) -> Result<ClientSecret, VoiceError> {
        if !self.is_enabled() {
            return Err(VoiceError::MissingApiKey);
        }

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.session_request())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(MAX_UPSTREAM_ERROR_CHARS).collect(),
            });
        }

        let parsed: ClientSecretResponse = response.json().await?;
        let value = parsed
            .value
            .filter(|v| !v.is_empty())
            .ok_or(VoiceError::MissingCredential)?;

        tracing::debug!(
            model = %self.config.model,
            expires_at = ?parsed.expires_at,
            "minted realtime client secret"
        );

        Ok(ClientSecret {
            value,
            expires_at: parsed.expires_at,
        })
    }
}
