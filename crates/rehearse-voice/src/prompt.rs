//! Interviewer instructions sent with every realtime session.

use crate::error::VoiceError;

/// Built-in interviewer persona: a technical recruiter running an
/// English-only mock phone interview for a JavaScript developer role.
pub const DEFAULT_INSTRUCTIONS: &str = include_str!("interviewer_prompt.md");

/// Loads instructions from `path`, or returns the built-in prompt.
///
/// # Errors
///
/// Returns [`VoiceError::Instructions`] if the file cannot be read.
pub fn load_instructions(path: Option<&str>) -> Result<String, VoiceError> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)?;
            tracing::info!(path = p, bytes = text.len(), "loaded interviewer instructions");
            Ok(text)
        }
        None => Ok(DEFAULT_INSTRUCTIONS.to_string()),
    }
}
