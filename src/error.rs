//! Engine error taxonomy
//!
//! Bust corrections are NOT errors: an illegal throw is silently rewritten
//! to a bust and the corrected score is the source of truth.

use thiserror::Error;

/// A leg already decided only accepts edits to the winner's own scores
pub const MESSAGE_LEG_ALREADY_WON: &str = "leg already won";
/// Turns can't be added to a finished match
pub const MESSAGE_MATCH_CONCLUDED: &str = "match already concluded";
/// The bot was asked to throw while a human is up
pub const MESSAGE_NOT_BOT_TURN: &str = "current thrower is not a dart bot";
/// Nothing left to delete
pub const MESSAGE_NO_TURNS: &str = "match has no recorded turns";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Unknown match/set/leg/round/player
    #[error("not found: {0}")]
    NotFound(String),
    /// Malformed input (turn out of range, bad settings, bad players)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Request clashes with the current match state
    #[error("conflict: {0}")]
    Conflict(String),
    /// Aggregate is internally inconsistent (caller data corruption)
    #[error("illegal state: {0}")]
    IllegalState(String),
    /// Repository or (de)serialization failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidArgument(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn illegal_state(what: impl Into<String>) -> Self {
        Self::IllegalState(what.into())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_context() {
        let err = EngineError::conflict(MESSAGE_LEG_ALREADY_WON);
        assert_eq!(err.to_string(), "conflict: leg already won");
    }

    #[test]
    fn test_serde_error_maps_to_storage() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("nope");
        let err: EngineError = parse.unwrap_err().into();
        assert!(matches!(err, EngineError::Storage(_)));
    }
}
