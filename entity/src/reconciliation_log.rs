use sea_orm::entity::prelude::*;

/// Record of cross-store operations and their latest outcome.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "reconciliation_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub operation: String,
    pub subject: String,
    pub payload: Json,
    pub status: String,
    pub detail: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
