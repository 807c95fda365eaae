use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameError {
    // Request validation
    #[error("Missing required parameter: {name}")]
    MissingParameter { name: String },
    #[error("Invalid value for parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },
    #[error("The word must have exactly 5 letters (got {length})")]
    InvalidGuessLength { length: usize },
    #[error("Authentication required for this action")]
    AuthenticationRequired,
    #[error("Unknown action: {action}")]
    UnknownAction { action: String },

    // Game domain
    #[error("Word not in vocabulary: {word}")]
    UnknownWord { word: String },
    #[error("No active game. Start a new game first.")]
    NoActiveGame,
    #[error("The game has already finished")]
    GameAlreadyFinished,
    #[error("No attempts remaining")]
    NoAttemptsRemaining,
    #[error("The vocabulary is empty")]
    EmptyVocabulary,

    // Account linking
    #[error("Invalid PIN")]
    InvalidPin,
    #[error("The PIN has expired, generate a new one")]
    ExpiredPin,
    #[error("No linked account exists")]
    NoLinkExists,
    #[error("Could not generate a unique PIN")]
    PinGenerationFailed,

    // Infrastructure
    #[error("Storage error: {message}")]
    Storage { message: String },
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GameError {
    pub fn missing(name: &str) -> Self {
        GameError::MissingParameter {
            name: name.to_string(),
        }
    }

    pub fn invalid(name: &str, value: &str) -> Self {
        GameError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Infrastructure failures are logged where they happen; clients only
    /// ever see a generic message for them.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, GameError::Storage { .. } | GameError::Internal { .. })
    }

    pub fn client_message(&self) -> String {
        match self {
            GameError::Storage { .. } => "Storage unavailable, please try again later".to_string(),
            GameError::Internal { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_hides_infrastructure_details() {
        let err = GameError::Storage {
            message: "database is locked".to_string(),
        };
        assert!(err.is_infrastructure());
        assert!(!err.client_message().contains("locked"));

        let err = GameError::InvalidGuessLength { length: 4 };
        assert!(!err.is_infrastructure());
        assert!(err.client_message().contains("5 letters"));
    }
}
