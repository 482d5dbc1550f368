use sea_orm_migration::{prelude::*, schema::*};

static IDX_RECONCILIATION_LOG_STATUS: &str = "idx-reconciliation_log-status";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReconciliationLog::Table)
                    .if_not_exists()
                    .col(pk_auto(ReconciliationLog::Id))
                    .col(string(ReconciliationLog::Operation))
                    .col(string(ReconciliationLog::Subject))
                    .col(json(ReconciliationLog::Payload))
                    .col(string(ReconciliationLog::Status))
                    .col(text_null(ReconciliationLog::Detail))
                    .col(timestamp(ReconciliationLog::CreatedAt))
                    .col(timestamp(ReconciliationLog::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_RECONCILIATION_LOG_STATUS)
                    .table(ReconciliationLog::Table)
                    .col(ReconciliationLog::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReconciliationLog::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum ReconciliationLog {
    Table,
    Id,
    Operation,
    Subject,
    Payload,
    Status,
    Detail,
    CreatedAt,
    UpdatedAt,
}
