use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

use crate::model::db::SessionPoolModel;

pub struct SessionPoolRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SessionPoolRepository<'a> {
    /// Creates a new instance of [`SessionPoolRepository`]
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn all(&self) -> Result<Vec<SessionPoolModel>, DbErr> {
        entity::prelude::SessionPool::find().all(self.db).await
    }
}
