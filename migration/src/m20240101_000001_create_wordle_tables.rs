use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Games::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Games::UserId).string().not_null().primary_key())
                    .col(ColumnDef::new(Games::TargetWord).string().not_null())
                    .col(ColumnDef::new(Games::Attempts).text().not_null())
                    .col(ColumnDef::new(Games::AttemptsLeft).integer().not_null())
                    .col(
                        ColumnDef::new(Games::IsWon)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Games::IsLost)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Games::LinkedIdentity).string().null())
                    .col(
                        ColumnDef::new(Games::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Games::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GameHistory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GameHistory::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(GameHistory::UserId).string().not_null())
                    .col(ColumnDef::new(GameHistory::TargetWord).string().not_null())
                    .col(ColumnDef::new(GameHistory::IsWon).boolean().not_null())
                    .col(ColumnDef::new(GameHistory::IsLost).boolean().not_null())
                    .col(ColumnDef::new(GameHistory::AttemptsUsed).integer().not_null())
                    .col(ColumnDef::new(GameHistory::TotalAttempts).integer().not_null())
                    .col(ColumnDef::new(GameHistory::Attempts).text().not_null())
                    .col(
                        ColumnDef::new(GameHistory::CompletedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GameHistory::GameStartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // History is always read per player in completion order
        manager
            .create_index(
                Index::create()
                    .name("idx_history_user_completed")
                    .table(GameHistory::Table)
                    .col(GameHistory::UserId)
                    .col(GameHistory::CompletedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LinkPins::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(LinkPins::Code).string().not_null().primary_key())
                    .col(ColumnDef::new(LinkPins::OwnerIdentity).string().not_null())
                    .col(
                        ColumnDef::new(LinkPins::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pins_owner")
                    .table(LinkPins::Table)
                    .col(LinkPins::OwnerIdentity)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LinkedAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LinkedAccounts::SecondaryIdentity)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LinkedAccounts::PrimaryIdentity)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LinkedAccounts::LinkedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_links_primary")
                    .table(LinkedAccounts::Table)
                    .col(LinkedAccounts::PrimaryIdentity)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LinkedAccounts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LinkPins::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GameHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Games::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Games {
    Table,
    UserId,
    TargetWord,
    Attempts,
    AttemptsLeft,
    IsWon,
    IsLost,
    LinkedIdentity,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GameHistory {
    Table,
    Id,
    UserId,
    TargetWord,
    IsWon,
    IsLost,
    AttemptsUsed,
    TotalAttempts,
    Attempts,
    CompletedAt,
    GameStartedAt,
}

#[derive(DeriveIden)]
enum LinkPins {
    Table,
    Code,
    OwnerIdentity,
    CreatedAt,
}

#[derive(DeriveIden)]
enum LinkedAccounts {
    Table,
    SecondaryIdentity,
    PrimaryIdentity,
    LinkedAt,
}
