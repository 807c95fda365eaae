use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use game_core::{Game, StatsEngine, WordSource};
use game_persistence::repositories::{GameRepository, HistoryRepository};
use game_types::{
    GameError, GameView, GuessReport, HistoryEntry, HistoryPage, HistoryQuery, HistoryWrite,
    MonthlyStats, StartOutcome, UserStats, VocabularySummary, WORD_LENGTH,
};

/// Log a repository failure and hide its details behind `GameError::Storage`.
pub(crate) fn storage_error(context: &'static str) -> impl Fn(anyhow::Error) -> GameError {
    move |err| {
        error!("{}: {:#}", context, err);
        GameError::Storage {
            message: format!("{}: {}", context, err),
        }
    }
}

/// Runs single-player games on top of the game and history stores.
/// Callers pass the effective identity; link resolution happens upstream.
pub struct GameManager {
    word_source: Arc<WordSource>,
    games: GameRepository,
    history: HistoryRepository,
}

impl GameManager {
    pub fn new(
        word_source: Arc<WordSource>,
        games: GameRepository,
        history: HistoryRepository,
    ) -> Self {
        Self {
            word_source,
            games,
            history,
        }
    }

    pub fn word_source(&self) -> &WordSource {
        &self.word_source
    }

    async fn load_game(&self, user_id: &str) -> Result<Option<Game>, GameError> {
        self.games
            .find(user_id)
            .await
            .map_err(storage_error("Failed to load game"))
    }

    /// Resume the running game, or start a new one when there is none or the
    /// previous one has finished.
    pub async fn start_game(
        &self,
        user_id: &str,
        linked_identity: Option<String>,
    ) -> Result<StartOutcome, GameError> {
        if let Some(game) = self.load_game(user_id).await? {
            if !game.is_terminal() {
                return Ok(StartOutcome {
                    game: game.view(),
                    resumed: true,
                });
            }
        }

        let target_word = self.word_source.random_word()?;
        let game = Game::new(user_id, &target_word, linked_identity);

        self.games
            .save(&game)
            .await
            .map_err(storage_error("Failed to save new game"))?;

        info!("Started new game for {}", user_id);

        Ok(StartOutcome {
            game: game.view(),
            resumed: false,
        })
    }

    pub async fn guess_word(&self, user_id: &str, guess: &str) -> Result<GuessReport, GameError> {
        let guess = guess.trim();
        let length = guess.chars().count();
        if length != WORD_LENGTH {
            return Err(GameError::InvalidGuessLength { length });
        }

        if !self.word_source.is_valid_word(guess) {
            return Err(GameError::UnknownWord {
                word: guess.to_uppercase(),
            });
        }

        let mut game = self
            .load_game(user_id)
            .await?
            .ok_or(GameError::NoActiveGame)?;

        let outcome = game.apply_guess(guess)?;

        self.games
            .save(&game)
            .await
            .map_err(storage_error("Failed to save game after guess"))?;

        let history_write = if outcome.is_terminal() {
            info!(
                "Game for {} finished: {:?} in {} attempts",
                user_id,
                outcome.status,
                game.state.attempts.len()
            );
            self.record_history(&game).await
        } else {
            HistoryWrite::NotRequired
        };

        Ok(GuessReport {
            feedback: outcome.feedback,
            attempts: game.state.attempts.clone(),
            attempts_left: game.state.attempts_left,
            is_won: game.state.is_won,
            is_lost: game.state.is_lost,
            game_status: outcome.status,
            target_word: game.is_terminal().then(|| game.target_word.clone()),
            history_write,
        })
    }

    /// The guess already stands, so a failed append is reported, not raised.
    async fn record_history(&self, game: &Game) -> HistoryWrite {
        let Some(entry) = game.history_entry(game.state.updated_at) else {
            return HistoryWrite::NotRequired;
        };

        match self.history.append(&entry).await {
            Ok(()) => HistoryWrite::Recorded,
            Err(e) => {
                error!(
                    "Failed to record history for {} (game kept): {:#}",
                    game.state.user_id, e
                );
                HistoryWrite::Failed
            }
        }
    }

    pub async fn current_game(&self, user_id: &str) -> Result<GameView, GameError> {
        self.load_game(user_id)
            .await?
            .map(|game| game.view())
            .ok_or(GameError::NoActiveGame)
    }

    pub async fn reset_game(
        &self,
        user_id: &str,
        linked_identity: Option<String>,
    ) -> Result<StartOutcome, GameError> {
        let removed = self
            .games
            .delete(user_id)
            .await
            .map_err(storage_error("Failed to delete game"))?;

        if removed {
            info!("Discarded previous game for {}", user_id);
        }

        self.start_game(user_id, linked_identity).await
    }

    async fn history_entries(&self, user_id: &str) -> Result<Vec<HistoryEntry>, GameError> {
        self.history
            .list_for_user(user_id)
            .await
            .map_err(storage_error("Failed to load game history"))
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats, GameError> {
        let entries = self.history_entries(user_id).await?;
        Ok(StatsEngine::user_stats(&entries))
    }

    pub async fn history(
        &self,
        user_id: &str,
        query: &HistoryQuery,
    ) -> Result<HistoryPage, GameError> {
        let entries = self.history_entries(user_id).await?;
        Ok(StatsEngine::history_page(&entries, query))
    }

    pub async fn monthly_stats(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
    ) -> Result<MonthlyStats, GameError> {
        if !(1..=12).contains(&month) {
            return Err(GameError::invalid("month", &month.to_string()));
        }

        let entries = self.history_entries(user_id).await?;
        Ok(StatsEngine::monthly_stats(&entries, year, month))
    }

    pub fn vocabulary_summary(&self, sample_size: usize) -> VocabularySummary {
        self.word_source.summary(sample_size)
    }

    /// Loads the vocabulary now instead of on the first request
    pub fn warm_up(&self) -> usize {
        let started = Utc::now();
        let count = self.word_source.words().len();
        info!(
            "Vocabulary ready with {} words in {} ms",
            count,
            (Utc::now() - started).num_milliseconds()
        );
        count
    }
}
