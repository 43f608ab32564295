//! Voice interviewer plumbing for the Rehearse platform.
//!
//! The voice session itself runs between the browser and a third-party
//! realtime speech API. The server's only job is to mint a short-lived
//! client secret bound to a fixed interviewer session (model, output voice
//! and instructions) so the browser never sees the long-lived API key.

pub mod config;
pub mod error;
pub mod prompt;
pub mod service;

pub use config::{RealtimeConfig, DEFAULT_REALTIME_BASE_URL};
pub use error::VoiceError;
pub use prompt::{load_instructions, DEFAULT_INSTRUCTIONS};
pub use service::{ClientSecret, ClientSecretRequest, RealtimeService};
