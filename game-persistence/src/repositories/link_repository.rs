use anyhow::Result;
use chrono::{DateTime, Utc};
use game_types::{LinkPin, LinkedAccount};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};

use crate::entities::{link_pins, linked_accounts, prelude::*};

/// Pending PINs and established account links
#[derive(Clone)]
pub struct LinkRepository {
    db: DatabaseConnection,
}

impl LinkRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_pin(model: link_pins::Model) -> LinkPin {
        LinkPin {
            code: model.code,
            owner_identity: model.owner_identity,
            created_at: model.created_at,
        }
    }

    fn model_to_link(model: linked_accounts::Model) -> LinkedAccount {
        LinkedAccount {
            secondary_identity: model.secondary_identity,
            primary_identity: model.primary_identity,
            linked_at: model.linked_at,
        }
    }

    pub async fn find_pin(&self, code: &str) -> Result<Option<LinkPin>> {
        let pin = LinkPins::find_by_id(code.to_string()).one(&self.db).await?;
        Ok(pin.map(Self::model_to_pin))
    }

    pub async fn insert_pin(&self, pin: &LinkPin) -> Result<()> {
        let model = link_pins::ActiveModel {
            code: Set(pin.code.clone()),
            owner_identity: Set(pin.owner_identity.clone()),
            created_at: Set(pin.created_at),
        };

        LinkPins::insert(model).exec(&self.db).await?;
        Ok(())
    }

    pub async fn delete_pin(&self, code: &str) -> Result<bool> {
        let result = LinkPins::delete_by_id(code.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Codes of every PIN currently stored, live or not yet swept
    pub async fn all_pin_codes(&self) -> Result<Vec<String>> {
        let pins = LinkPins::find().all(&self.db).await?;
        Ok(pins.into_iter().map(|pin| pin.code).collect())
    }

    pub async fn pins_for_owner(&self, owner_identity: &str) -> Result<Vec<LinkPin>> {
        let pins = LinkPins::find()
            .filter(link_pins::Column::OwnerIdentity.eq(owner_identity))
            .all(&self.db)
            .await?;
        Ok(pins.into_iter().map(Self::model_to_pin).collect())
    }

    pub async fn delete_pins_for_owner(&self, owner_identity: &str) -> Result<u64> {
        let result = LinkPins::delete_many()
            .filter(link_pins::Column::OwnerIdentity.eq(owner_identity))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Removes every PIN created strictly before `cutoff`
    pub async fn delete_expired_pins(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = LinkPins::delete_many()
            .filter(link_pins::Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn find_link_by_secondary(
        &self,
        secondary_identity: &str,
    ) -> Result<Option<LinkedAccount>> {
        let link = LinkedAccounts::find_by_id(secondary_identity.to_string())
            .one(&self.db)
            .await?;
        Ok(link.map(Self::model_to_link))
    }

    /// Bindings held by a primary identity, newest first
    pub async fn find_links_by_primary(&self, primary_identity: &str) -> Result<Vec<LinkedAccount>> {
        let links = LinkedAccounts::find()
            .filter(linked_accounts::Column::PrimaryIdentity.eq(primary_identity))
            .order_by_desc(linked_accounts::Column::LinkedAt)
            .all(&self.db)
            .await?;
        Ok(links.into_iter().map(Self::model_to_link).collect())
    }

    /// A secondary identity can only be bound once; relinking replaces the
    /// previous binding.
    pub async fn upsert_link(&self, link: &LinkedAccount) -> Result<()> {
        let model = linked_accounts::ActiveModel {
            secondary_identity: Set(link.secondary_identity.clone()),
            primary_identity: Set(link.primary_identity.clone()),
            linked_at: Set(link.linked_at),
        };

        LinkedAccounts::insert(model)
            .on_conflict(
                OnConflict::column(linked_accounts::Column::SecondaryIdentity)
                    .update_columns([
                        linked_accounts::Column::PrimaryIdentity,
                        linked_accounts::Column::LinkedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Drops every binding and pending PIN of a primary identity atomically.
    /// Returns `(links_removed, pins_removed)`.
    pub async fn unlink_primary(&self, primary_identity: &str) -> Result<(u64, u64)> {
        let txn = self.db.begin().await?;

        let links = LinkedAccounts::delete_many()
            .filter(linked_accounts::Column::PrimaryIdentity.eq(primary_identity))
            .exec(&txn)
            .await?;

        let pins = LinkPins::delete_many()
            .filter(link_pins::Column::OwnerIdentity.eq(primary_identity))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok((links.rows_affected, pins.rows_affected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use chrono::Duration;
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> LinkRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        LinkRepository::new(db)
    }

    fn pin(code: &str, owner: &str, created_at: DateTime<Utc>) -> LinkPin {
        LinkPin {
            code: code.to_string(),
            owner_identity: owner.to_string(),
            created_at,
        }
    }

    fn link(secondary: &str, primary: &str, linked_at: DateTime<Utc>) -> LinkedAccount {
        LinkedAccount {
            secondary_identity: secondary.to_string(),
            primary_identity: primary.to_string(),
            linked_at,
        }
    }

    #[tokio::test]
    async fn test_pin_lifecycle() {
        let repo = setup_test_db().await;
        let now = Utc::now();

        repo.insert_pin(&pin("1234", "web-user", now)).await.unwrap();
        repo.insert_pin(&pin("5678", "web-user", now)).await.unwrap();
        repo.insert_pin(&pin("4321", "other-user", now)).await.unwrap();

        let found = repo.find_pin("1234").await.unwrap().unwrap();
        assert_eq!(found.owner_identity, "web-user");
        assert_eq!(repo.pins_for_owner("web-user").await.unwrap().len(), 2);
        assert_eq!(repo.all_pin_codes().await.unwrap().len(), 3);

        assert!(repo.delete_pin("4321").await.unwrap());
        assert!(!repo.delete_pin("4321").await.unwrap());
        assert_eq!(repo.delete_pins_for_owner("web-user").await.unwrap(), 2);
        assert!(repo.find_pin("1234").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_expired_pins() {
        let repo = setup_test_db().await;
        let now = Utc::now();

        repo.insert_pin(&pin("1111", "a", now - Duration::seconds(600)))
            .await
            .unwrap();
        repo.insert_pin(&pin("2222", "b", now - Duration::seconds(301)))
            .await
            .unwrap();
        repo.insert_pin(&pin("3333", "c", now)).await.unwrap();

        let cutoff = now - Duration::seconds(300);
        assert_eq!(repo.delete_expired_pins(cutoff).await.unwrap(), 2);
        assert_eq!(repo.delete_expired_pins(cutoff).await.unwrap(), 0);
        assert!(repo.find_pin("3333").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_link_replaces_binding() {
        let repo = setup_test_db().await;
        let now = Utc::now();

        repo.upsert_link(&link("amzn1.ask.account.A", "web-1", now))
            .await
            .unwrap();
        repo.upsert_link(&link("amzn1.ask.account.A", "web-2", now + Duration::seconds(1)))
            .await
            .unwrap();

        let found = repo
            .find_link_by_secondary("amzn1.ask.account.A")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.primary_identity, "web-2");
        assert!(repo.find_links_by_primary("web-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_links_by_primary_newest_first() {
        let repo = setup_test_db().await;
        let now = Utc::now();

        repo.upsert_link(&link("amzn1.ask.account.OLD", "web-1", now - Duration::days(1)))
            .await
            .unwrap();
        repo.upsert_link(&link("amzn1.ask.account.NEW", "web-1", now))
            .await
            .unwrap();

        let links = repo.find_links_by_primary("web-1").await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].secondary_identity, "amzn1.ask.account.NEW");
    }

    #[tokio::test]
    async fn test_unlink_primary_removes_links_and_pins() {
        let repo = setup_test_db().await;
        let now = Utc::now();

        repo.upsert_link(&link("amzn1.ask.account.A", "web-1", now))
            .await
            .unwrap();
        repo.upsert_link(&link("amzn1.ask.account.B", "web-1", now))
            .await
            .unwrap();
        repo.upsert_link(&link("amzn1.ask.account.C", "web-2", now))
            .await
            .unwrap();
        repo.insert_pin(&pin("1234", "web-1", now)).await.unwrap();

        let (links, pins) = repo.unlink_primary("web-1").await.unwrap();
        assert_eq!((links, pins), (2, 1));
        assert!(repo.find_links_by_primary("web-1").await.unwrap().is_empty());
        assert_eq!(repo.find_links_by_primary("web-2").await.unwrap().len(), 1);
    }
}
