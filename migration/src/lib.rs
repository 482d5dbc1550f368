pub use sea_orm_migration::prelude::*;

mod m20250301_000001_institution;
mod m20250301_000002_user;
mod m20250301_000003_session_pool;
mod m20250301_000004_reconciliation_log;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_institution::Migration),
            Box::new(m20250301_000002_user::Migration),
            Box::new(m20250301_000003_session_pool::Migration),
            Box::new(m20250301_000004_reconciliation_log::Migration),
        ]
    }
}
