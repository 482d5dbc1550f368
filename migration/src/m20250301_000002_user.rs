use sea_orm_migration::{prelude::*, schema::*};

static IDX_USER_INSTITUTION_ID: &str = "idx-users-institution_id";
static IDX_USER_FIREBASE_UID: &str = "idx-users-firebase_uid";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // institution_id has no foreign key: the legacy mirror contains dangling references
        // which the consistency checks need to be able to see.
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(pk_uuid(User::Id))
                    .col(string_null(User::FirebaseUid))
                    .col(string_uniq(User::Email))
                    .col(string_null(User::Name))
                    .col(string(User::Role))
                    .col(uuid_null(User::InstitutionId))
                    .col(timestamp(User::CreatedAt))
                    .col(timestamp(User::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_USER_INSTITUTION_ID)
                    .table(User::Table)
                    .col(User::InstitutionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_USER_FIREBASE_UID)
                    .table(User::Table)
                    .col(User::FirebaseUid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    FirebaseUid,
    Email,
    Name,
    Role,
    InstitutionId,
    CreatedAt,
    UpdatedAt,
}
