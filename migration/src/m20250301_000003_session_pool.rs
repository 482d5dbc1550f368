use sea_orm_migration::{prelude::*, schema::*};

static IDX_SESSION_POOL_INSTITUTION_ID: &str = "idx-session_pools-institution_id";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SessionPool::Table)
                    .if_not_exists()
                    .col(pk_uuid(SessionPool::Id))
                    .col(uuid(SessionPool::InstitutionId))
                    .col(integer(SessionPool::TotalSessions).default(0))
                    .col(integer(SessionPool::UsedSessions).default(0))
                    .col(timestamp(SessionPool::CreatedAt))
                    .col(timestamp(SessionPool::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_SESSION_POOL_INSTITUTION_ID)
                    .table(SessionPool::Table)
                    .col(SessionPool::InstitutionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SessionPool::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum SessionPool {
    #[sea_orm(iden = "session_pools")]
    Table,
    Id,
    InstitutionId,
    TotalSessions,
    UsedSessions,
    CreatedAt,
    UpdatedAt,
}
