use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("realtime API key is not configured")]
    MissingApiKey,

    #[error("failed to read interviewer instructions: {0}")]
    Instructions(#[from] std::io::Error),

    #[error("realtime HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("realtime API returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("realtime API response carried no client secret")]
    MissingCredential,
}
