use anyhow::Result;
use game_types::HistoryEntry;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::{game_history, prelude::*};

/// Append-only log of finished games
#[derive(Clone)]
pub struct HistoryRepository {
    db: DatabaseConnection,
}

impl HistoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_entry(model: game_history::Model) -> Result<HistoryEntry> {
        Ok(HistoryEntry {
            id: model.id,
            user_id: model.user_id,
            target_word: model.target_word,
            is_won: model.is_won,
            is_lost: model.is_lost,
            attempts_used: u32::try_from(model.attempts_used)?,
            total_attempts: u32::try_from(model.total_attempts)?,
            attempts: serde_json::from_str(&model.attempts)?,
            completed_at: model.completed_at,
            game_started_at: model.game_started_at,
        })
    }

    pub async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let model = game_history::ActiveModel {
            id: Set(entry.id),
            user_id: Set(entry.user_id.clone()),
            target_word: Set(entry.target_word.clone()),
            is_won: Set(entry.is_won),
            is_lost: Set(entry.is_lost),
            attempts_used: Set(i32::try_from(entry.attempts_used)?),
            total_attempts: Set(i32::try_from(entry.total_attempts)?),
            attempts: Set(serde_json::to_string(&entry.attempts)?),
            completed_at: Set(entry.completed_at),
            game_started_at: Set(entry.game_started_at),
        };

        GameHistory::insert(model).exec(&self.db).await?;
        Ok(())
    }

    /// All entries for a player, oldest first
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<HistoryEntry>> {
        GameHistory::find()
            .filter(game_history::Column::UserId.eq(user_id))
            .order_by_asc(game_history::Column::CompletedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_entry)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use chrono::{Duration, Utc};
    use game_core::Game;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> HistoryRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        HistoryRepository::new(db)
    }

    fn finished_game(user_id: &str, won: bool) -> Game {
        let mut game = Game::new(user_id, "plato", None);
        if won {
            game.apply_guess("plato").unwrap();
        } else {
            for _ in 0..6 {
                game.apply_guess("prado").unwrap();
            }
        }
        game
    }

    #[tokio::test]
    async fn test_append_and_list_in_completion_order() {
        let repo = setup_test_db().await;
        let now = Utc::now();

        let later = finished_game("player-1", false).history_entry(now).unwrap();
        let earlier = finished_game("player-1", true)
            .history_entry(now - Duration::hours(1))
            .unwrap();
        let other = finished_game("player-2", true).history_entry(now).unwrap();

        repo.append(&later).await.unwrap();
        repo.append(&earlier).await.unwrap();
        repo.append(&other).await.unwrap();

        let entries = repo.list_for_user("player-1").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, earlier.id);
        assert!(entries[0].is_won);
        assert_eq!(entries[1].id, later.id);
        assert_eq!(entries[1].total_attempts, 6);
        assert_eq!(entries[1].attempts.len(), 6);
    }

    #[tokio::test]
    async fn test_unknown_user_has_empty_history() {
        let repo = setup_test_db().await;
        assert!(repo.list_for_user("nobody").await.unwrap().is_empty());
    }
}
