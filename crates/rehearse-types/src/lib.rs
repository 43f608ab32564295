//! Shared types for the Rehearse platform.
//!
//! This crate holds the small vocabulary that every other crate agrees on:
//! the orientation of a community question and the kind of vote a user can
//! cast on it. Both serialize to the lowercase strings used on the wire and
//! in the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The value is not `backend` or `frontend`.
    #[error("invalid orientation: {0}")]
    Orientation(String),
    /// The value is not `like` or `dislike`.
    #[error("invalid vote type: {0}")]
    VoteType(String),
}

/// Which side of the stack a question targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Server-side engineering.
    Backend,
    /// Client-side engineering.
    Frontend,
}

impl Orientation {
    /// Returns the wire/database label for this orientation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
        }
    }
}

impl FromStr for Orientation {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "backend" => Ok(Self::Backend),
            "frontend" => Ok(Self::Frontend),
            other => Err(ParseError::Orientation(other.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user's opinion on a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    /// Counts toward `likes`.
    Like,
    /// Counts toward `dislikes`.
    Dislike,
}

impl VoteType {
    /// Returns the wire/database label for this vote type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    /// Returns the other vote type.
    pub fn opposite(self) -> Self {
        match self {
            Self::Like => Self::Dislike,
            Self::Dislike => Self::Like,
        }
    }
}

impl FromStr for VoteType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Self::Like),
            "dislike" => Ok(Self::Dislike),
            other => Err(ParseError::VoteType(other.to_string())),
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_labels_parse_back() {
        for orientation in [Orientation::Backend, Orientation::Frontend] {
            assert_eq!(orientation.as_str().parse::<Orientation>(), Ok(orientation));
        }
    }

    #[test]
    fn orientation_rejects_unknown_and_mixed_case() {
        assert_eq!(
            "fullstack".parse::<Orientation>(),
            Err(ParseError::Orientation("fullstack".to_string()))
        );
        assert!("Backend".parse::<Orientation>().is_err());
    }

    #[test]
    fn vote_type_labels_parse_back() {
        assert_eq!("like".parse::<VoteType>(), Ok(VoteType::Like));
        assert_eq!("dislike".parse::<VoteType>(), Ok(VoteType::Dislike));
        assert!("upvote".parse::<VoteType>().is_err());
        assert!("".parse::<VoteType>().is_err());
    }

    #[test]
    fn vote_type_opposite() {
        assert_eq!(VoteType::Like.opposite(), VoteType::Dislike);
        assert_eq!(VoteType::Dislike.opposite(), VoteType::Like);
    }

    #[test]
    fn serde_uses_lowercase_labels() {
        assert_eq!(
            serde_json::to_string(&VoteType::Dislike).unwrap(),
            "\"dislike\""
        );
        let parsed: Orientation = serde_json::from_str("\"frontend\"").unwrap();
        assert_eq!(parsed, Orientation::Frontend);
    }
}
