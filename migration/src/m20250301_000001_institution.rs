use sea_orm_migration::{prelude::*, schema::*};

static IDX_INSTITUTION_NAME: &str = "idx-institutions-name";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Institution::Table)
                    .if_not_exists()
                    .col(pk_uuid(Institution::Id))
                    .col(string(Institution::Name))
                    .col(string_null(Institution::Domain))
                    .col(string_null(Institution::ContactEmail))
                    .col(string(Institution::ApprovalStatus).default("pending"))
                    .col(boolean(Institution::IsActive).default(true))
                    .col(timestamp(Institution::CreatedAt))
                    .col(timestamp(Institution::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_INSTITUTION_NAME)
                    .table(Institution::Table)
                    .col(Institution::Name)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_INSTITUTION_NAME)
                    .table(Institution::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Institution::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Institution {
    #[sea_orm(iden = "institutions")]
    Table,
    Id,
    Name,
    Domain,
    ContactEmail,
    ApprovalStatus,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
