use anyhow::Result;
use game_core::Game;
use game_types::GameState;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, DatabaseConnection, EntityTrait};

use crate::entities::{games, prelude::*};

/// One row per player; the row is the whole game.
#[derive(Clone)]
pub struct GameRepository {
    db: DatabaseConnection,
}

impl GameRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_game(model: games::Model) -> Result<Game> {
        Ok(Game {
            state: GameState {
                user_id: model.user_id,
                attempts: serde_json::from_str(&model.attempts)?,
                attempts_left: u32::try_from(model.attempts_left)?,
                is_won: model.is_won,
                is_lost: model.is_lost,
                created_at: model.created_at,
                updated_at: model.updated_at,
                linked_identity: model.linked_identity,
            },
            target_word: model.target_word,
        })
    }

    pub async fn find(&self, user_id: &str) -> Result<Option<Game>> {
        Games::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
            .map(Self::model_to_game)
            .transpose()
    }

    /// Insert or overwrite the player's game. Concurrent saves for the same
    /// player are not coordinated; the last one wins.
    pub async fn save(&self, game: &Game) -> Result<()> {
        let model = games::ActiveModel {
            user_id: Set(game.state.user_id.clone()),
            target_word: Set(game.target_word.clone()),
            attempts: Set(serde_json::to_string(&game.state.attempts)?),
            attempts_left: Set(i32::try_from(game.state.attempts_left)?),
            is_won: Set(game.state.is_won),
            is_lost: Set(game.state.is_lost),
            linked_identity: Set(game.state.linked_identity.clone()),
            created_at: Set(game.state.created_at),
            updated_at: Set(game.state.updated_at),
        };

        Games::insert(model)
            .on_conflict(
                OnConflict::column(games::Column::UserId)
                    .update_columns([
                        games::Column::TargetWord,
                        games::Column::Attempts,
                        games::Column::AttemptsLeft,
                        games::Column::IsWon,
                        games::Column::IsLost,
                        games::Column::LinkedIdentity,
                        games::Column::CreatedAt,
                        games::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Returns whether a game was actually removed
    pub async fn delete(&self, user_id: &str) -> Result<bool> {
        let result = Games::delete_by_id(user_id.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> GameRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        GameRepository::new(db)
    }

    #[tokio::test]
    async fn test_save_and_find_game() {
        let repo = setup_test_db().await;
        let game = Game::new("player-1", "plato", Some("amzn1.ask.account.X".to_string()));

        repo.save(&game).await.unwrap();

        let found = repo.find("player-1").await.unwrap().unwrap();
        assert_eq!(found.target_word, "PLATO");
        assert_eq!(found.state.attempts_left, 6);
        assert_eq!(found.state.linked_identity.as_deref(), Some("amzn1.ask.account.X"));
        assert!(repo.find("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_game() {
        let repo = setup_test_db().await;
        let mut game = Game::new("player-1", "plato", None);
        repo.save(&game).await.unwrap();

        game.apply_guess("prado").unwrap();
        game.apply_guess("plato").unwrap();
        repo.save(&game).await.unwrap();

        let found = repo.find("player-1").await.unwrap().unwrap();
        assert_eq!(found.state.attempts.len(), 2);
        assert_eq!(found.state.attempts[1].guess, "PLATO");
        assert_eq!(found.state.attempts[0].feedback, game.state.attempts[0].feedback);
        assert!(found.state.is_won);
        assert_eq!(found.state.attempts_left, 4);
    }

    #[tokio::test]
    async fn test_delete_game() {
        let repo = setup_test_db().await;
        repo.save(&Game::new("player-1", "plato", None)).await.unwrap();

        assert!(repo.delete("player-1").await.unwrap());
        assert!(!repo.delete("player-1").await.unwrap());
        assert!(repo.find("player-1").await.unwrap().is_none());
    }
}
