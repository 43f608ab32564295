//! Caller identity for the Rehearse platform.
//!
//! Sign-in is handled by an external identity provider; this crate only
//! verifies the signed session tokens it issues and turns them into an
//! [`AuthenticatedUser`]. Tokens arrive either as an `Authorization: Bearer`
//! header or in the provider's `__session` cookie.

mod config;

pub use config::{AuthConfig, SessionAlgorithm};

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Name of the cookie the identity provider stores its session token in.
pub const SESSION_COOKIE: &str = "__session";

/// Errors produced while configuring or running session verification.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// `HS256` was selected but no secret is configured.
    #[error("auth secret is not configured")]
    MissingSecret,
    /// `RS256` was selected but no public key path is configured.
    #[error("auth public key path is not configured")]
    MissingPublicKey,
    /// The public key file could not be read.
    #[error("failed to read auth public key: {0}")]
    KeyRead(#[from] std::io::Error),
    /// The key material could not be parsed.
    #[error("invalid auth key: {0}")]
    InvalidKey(jsonwebtoken::errors::Error),
    /// The token failed signature, expiry, or issuer validation.
    #[error("invalid session token: {0}")]
    InvalidToken(jsonwebtoken::errors::Error),
    /// The token verified but carries no subject.
    #[error("session token has no subject")]
    MissingSubject,
}

/// Claims read from a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The identity provider's user id.
    pub sub: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Provider session id, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

/// A caller whose session token verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub session_id: Option<String>,
}

/// Verifies session tokens against one configured key.
#[derive(Clone)]
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for SessionVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SessionVerifier {
    /// Builds a verifier from configuration, reading the PEM key from disk
    /// for `RS256`.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected algorithm's key material is missing,
    /// unreadable, or malformed.
    pub fn from_config(config: &AuthConfig) -> Result<Self, IdentityError> {
        let (key, algorithm) = match config.algorithm {
            SessionAlgorithm::Hs256 => {
                if config.secret.is_empty() {
                    return Err(IdentityError::MissingSecret);
                }
                (
                    DecodingKey::from_secret(config.secret.as_bytes()),
                    Algorithm::HS256,
                )
            }
            SessionAlgorithm::Rs256 => {
                let path = config
                    .public_key_path
                    .as_deref()
                    .ok_or(IdentityError::MissingPublicKey)?;
                let pem = std::fs::read(path)?;
                let key = DecodingKey::from_rsa_pem(&pem).map_err(IdentityError::InvalidKey)?;
                (key, Algorithm::RS256)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = config.leeway_seconds;
        validation.validate_nbf = true;
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self { key, validation })
    }

    /// Verifies `token` and returns the caller it identifies.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::InvalidToken`] for bad signatures, expired or
    /// not-yet-valid tokens and issuer mismatches, and
    /// [`IdentityError::MissingSubject`] when `sub` is empty.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, IdentityError> {
        let data = match decode::<SessionClaims>(token, &self.key, &self.validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
                return Err(IdentityError::InvalidToken(e));
            }
        };

        if data.claims.sub.trim().is_empty() {
            tracing::debug!(sid = ?data.claims.sid, "session token rejected: empty subject");
            return Err(IdentityError::MissingSubject);
        }

        Ok(AuthenticatedUser {
            user_id: data.claims.sub,
            session_id: data.claims.sid,
        })
    }

    /// Resolves the caller from request headers.
    ///
    /// Tries the bearer token first and the session cookie second; a bearer
    /// token that fails verification does not hide a valid cookie. Returns
    /// `None` when no candidate verifies.
    pub fn authenticate(
        &self,
        authorization: Option<&str>,
        cookie: Option<&str>,
    ) -> Option<AuthenticatedUser> {
        session_token_candidates(authorization, cookie)
            .into_iter()
            .find_map(|token| self.verify(token).ok())
    }
}

/// Collects the session tokens carried by request headers, in the order they
/// should be tried: the bearer `Authorization` token, then the session
/// cookie. Empty values are skipped.
pub fn session_token_candidates<'a>(
    authorization: Option<&'a str>,
    cookie: Option<&'a str>,
) -> Vec<&'a str> {
    let bearer = authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    let session_cookie = cookie.and_then(|header| {
        header.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        })
    });

    bearer.into_iter().chain(session_cookie).collect()
}
