use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder};

use crate::model::db::UserModel;

pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    /// Creates a new instance of [`UserRepository`]
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Every user row, ordered by email
    pub async fn all(&self) -> Result<Vec<UserModel>, DbErr> {
        entity::prelude::User::find()
            .order_by_asc(entity::user::Column::Email)
            .all(self.db)
            .await
    }
}
