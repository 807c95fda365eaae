use chrono::{DateTime, Utc};
use game_types::{
    Attempt, GameError, GameState, GameStatus, GameView, HistoryEntry, LetterFeedback, MAX_ATTEMPTS,
};
use uuid::Uuid;

use crate::FeedbackEngine;

/// A single player's game. Only `state` is ever shown to the player while
/// the game is running.
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub state: GameState,
    pub target_word: String, // Hidden from clients until the game ends
}

/// What a single accepted guess did to the game
#[derive(Debug, Clone, PartialEq)]
pub struct GuessOutcome {
    pub feedback: Vec<LetterFeedback>,
    pub status: GameStatus,
}

impl GuessOutcome {
    pub fn is_terminal(&self) -> bool {
        self.status != GameStatus::Playing
    }
}

impl Game {
    pub fn new(user_id: &str, target_word: &str, linked_identity: Option<String>) -> Self {
        Self::new_at(user_id, target_word, linked_identity, Utc::now())
    }

    pub fn new_at(
        user_id: &str,
        target_word: &str,
        linked_identity: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let state = GameState {
            user_id: user_id.to_string(),
            attempts: Vec::new(),
            attempts_left: MAX_ATTEMPTS,
            is_won: false,
            is_lost: false,
            created_at: now,
            updated_at: now,
            linked_identity,
        };

        Self {
            state,
            target_word: target_word.to_uppercase(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Apply an already length- and vocabulary-checked guess.
    pub fn apply_guess(&mut self, guess: &str) -> Result<GuessOutcome, GameError> {
        self.apply_guess_at(guess, Utc::now())
    }

    pub fn apply_guess_at(
        &mut self,
        guess: &str,
        now: DateTime<Utc>,
    ) -> Result<GuessOutcome, GameError> {
        if self.is_terminal() {
            return Err(GameError::GameAlreadyFinished);
        }

        // Unreachable while the won/lost flags are kept consistent
        if self.state.attempts_left == 0 {
            return Err(GameError::NoAttemptsRemaining);
        }

        let guess = guess.trim().to_uppercase();
        let feedback = FeedbackEngine::evaluate(&guess, &self.target_word);

        let is_won = guess == self.target_word;
        self.state.attempts_left -= 1;
        self.state.attempts.push(Attempt {
            guess,
            feedback: feedback.clone(),
        });
        self.state.is_won = is_won;
        self.state.is_lost = !is_won && self.state.attempts_left == 0;
        self.state.updated_at = now;

        Ok(GuessOutcome {
            feedback,
            status: self.state.status(),
        })
    }

    /// Client view; the target word is revealed only for a finished game.
    pub fn view(&self) -> GameView {
        GameView {
            state: self.state.clone(),
            game_status: self.state.status(),
            target_word: self.is_terminal().then(|| self.target_word.clone()),
        }
    }

    /// Snapshot for the history log. `None` while the game is still running.
    pub fn history_entry(&self, completed_at: DateTime<Utc>) -> Option<HistoryEntry> {
        if !self.is_terminal() {
            return None;
        }

        Some(HistoryEntry {
            id: Uuid::new_v4(),
            user_id: self.state.user_id.clone(),
            target_word: self.target_word.clone(),
            is_won: self.state.is_won,
            is_lost: self.state.is_lost,
            attempts_used: self.state.attempts_used(),
            total_attempts: self.state.attempts.len() as u32,
            attempts: self.state.attempts.clone(),
            completed_at,
            game_started_at: self.state.created_at,
        })
    }
}
