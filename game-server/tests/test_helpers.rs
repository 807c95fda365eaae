#![allow(dead_code)]

use std::sync::Arc;

use game_core::{DEFAULT_SECONDARY_PREFIX, WordSource};
use game_persistence::DatabaseManager;
use game_persistence::connection::connect_to_memory_database;
use game_server::dispatch::Dispatcher;
use game_server::game_manager::GameManager;
use game_server::link_manager::LinkManager;
use migration::{Migrator, MigratorTrait};

pub const TEST_WORDS: [&str; 8] = [
    "plato", "prado", "placa", "brazo", "campo", "llama", "salto", "jumbo",
];

pub const ALEXA_USER: &str = "amzn1.ask.account.TEST";

/// Test setup that provides all necessary components over one in-memory database
pub struct TestServerSetup {
    pub database: DatabaseManager,
    pub game_manager: Arc<GameManager>,
    pub link_manager: Arc<LinkManager>,
    pub dispatcher: Dispatcher,
}

impl TestServerSetup {
    pub async fn new() -> Self {
        Self::with_words(&TEST_WORDS).await
    }

    pub async fn with_words(words: &[&str]) -> Self {
        Self::with_word_source(WordSource::from_words(words)).await
    }

    pub async fn with_word_source(word_source: WordSource) -> Self {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let database = DatabaseManager::from_connection(db);

        let game_manager = Arc::new(GameManager::new(
            Arc::new(word_source),
            database.games(),
            database.history(),
        ));
        let link_manager = Arc::new(LinkManager::new(
            database.links(),
            DEFAULT_SECONDARY_PREFIX,
        ));
        let dispatcher = Dispatcher::new(game_manager.clone(), link_manager.clone());

        Self {
            database,
            game_manager,
            link_manager,
            dispatcher,
        }
    }

    /// Peek at the hidden target of a player's game
    pub async fn target_word(&self, user_id: &str) -> String {
        self.database
            .games()
            .find(user_id)
            .await
            .unwrap()
            .expect("player should have a game")
            .target_word
    }

    /// Any vocabulary word that is not the target
    pub async fn wrong_word(&self, user_id: &str) -> String {
        let target = self.target_word(user_id).await;
        TEST_WORDS
            .iter()
            .map(|word| word.to_uppercase())
            .find(|word| *word != target)
            .unwrap()
    }

    /// Start a game and lose it with six wrong guesses
    pub async fn play_losing_game(&self, user_id: &str) {
        self.game_manager.start_game(user_id, None).await.unwrap();
        let wrong = self.wrong_word(user_id).await;
        for _ in 0..6 {
            self.game_manager.guess_word(user_id, &wrong).await.unwrap();
        }
    }

    /// Start a game and win it on the first guess
    pub async fn play_winning_game(&self, user_id: &str) {
        self.game_manager.start_game(user_id, None).await.unwrap();
        let target = self.target_word(user_id).await;
        self.game_manager.guess_word(user_id, &target).await.unwrap();
    }
}
