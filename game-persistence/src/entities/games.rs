use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "games")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub target_word: String,
    /// JSON array of `{ guess, feedback }`
    #[sea_orm(column_type = "Text")]
    pub attempts: String,
    pub attempts_left: i32,
    pub is_won: bool,
    pub is_lost: bool,
    pub linked_identity: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
