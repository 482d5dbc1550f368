use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder};
use uuid::Uuid;

use crate::model::db::InstitutionModel;

pub struct InstitutionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> InstitutionRepository<'a> {
    /// Creates a new instance of [`InstitutionRepository`]
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Every institution row, ordered by name
    pub async fn all(&self) -> Result<Vec<InstitutionModel>, DbErr> {
        entity::prelude::Institution::find()
            .order_by_asc(entity::institution::Column::Name)
            .all(self.db)
            .await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InstitutionModel>, DbErr> {
        entity::prelude::Institution::find_by_id(id)
            .one(self.db)
            .await
    }
}
