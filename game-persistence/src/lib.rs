pub mod connection;
pub mod entities;
pub mod repositories;

use sea_orm::{DatabaseConnection, DbErr};

use repositories::{GameRepository, HistoryRepository, LinkRepository};

/// Owns the pool and hands out repositories that share it.
#[derive(Clone)]
pub struct DatabaseManager {
    connection: DatabaseConnection,
}

impl DatabaseManager {
    /// Connects and brings the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self, DbErr> {
        let connection = connection::connect_and_migrate(database_url).await?;
        Ok(Self { connection })
    }

    pub fn from_connection(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    pub fn get_connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    pub fn games(&self) -> GameRepository {
        GameRepository::new(self.connection.clone())
    }

    pub fn history(&self) -> HistoryRepository {
        HistoryRepository::new(self.connection.clone())
    }

    pub fn links(&self) -> LinkRepository {
        LinkRepository::new(self.connection.clone())
    }
}
