use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::HistoryWrite;

pub const WORD_LENGTH: usize = 5;
pub const MAX_ATTEMPTS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum LetterStatus {
    #[serde(rename = "correct_pos")]
    CorrectPosition, // right letter, right slot
    #[serde(rename = "correct_wrong_pos")]
    CorrectWrongPosition, // letter is in the word elsewhere
    #[serde(rename = "not_in_word")]
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LetterFeedback {
    pub letter: String,
    pub status: LetterStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Attempt {
    pub guess: String,
    pub feedback: Vec<LetterFeedback>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

/// Player-visible part of a game. The target word lives next to it in
/// `game_core::Game` and is never part of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub user_id: String,
    pub attempts: Vec<Attempt>,
    pub attempts_left: u32,
    pub is_won: bool,
    pub is_lost: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub linked_identity: Option<String>,
}

impl GameState {
    pub fn status(&self) -> GameStatus {
        if self.is_won {
            GameStatus::Won
        } else if self.is_lost {
            GameStatus::Lost
        } else {
            GameStatus::Playing
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.is_won || self.is_lost
    }

    pub fn attempts_used(&self) -> u32 {
        MAX_ATTEMPTS.saturating_sub(self.attempts_left)
    }
}

/// Game as returned to clients; `target_word` is only filled in once the
/// game is over.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    #[serde(flatten)]
    pub state: GameState,
    pub game_status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_word: Option<String>,
}

/// Result of starting (or resuming) a game
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    pub game: GameView,
    pub resumed: bool,
}

/// Result of a single accepted guess
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GuessReport {
    pub feedback: Vec<LetterFeedback>,
    pub attempts: Vec<Attempt>,
    pub attempts_left: u32,
    pub is_won: bool,
    pub is_lost: bool,
    pub game_status: GameStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_word: Option<String>,
    pub history_write: HistoryWrite,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VocabularySummary {
    pub total_words: usize,
    pub sample: Vec<String>,
}
