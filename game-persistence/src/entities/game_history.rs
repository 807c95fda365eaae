use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "game_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub target_word: String,
    pub is_won: bool,
    pub is_lost: bool,
    pub attempts_used: i32,
    pub total_attempts: i32,
    #[sea_orm(column_type = "Text")]
    pub attempts: String,
    pub completed_at: DateTimeUtc,
    pub game_started_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
