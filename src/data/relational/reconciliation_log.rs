use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder,
};
use serde_json::Value;

use crate::model::{
    db::ReconciliationLogModel,
    reconciliation::{LogStatus, Operation},
};

/// Ledger of cross-store operations.
///
/// Entries are added or have their outcome updated; nothing is deleted.
pub struct ReconciliationLogRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ReconciliationLogRepository<'a> {
    /// Creates a new instance of [`ReconciliationLogRepository`]
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an entry
    ///
    /// # Arguments
    /// - `operation` - The cross-store operation attempted
    /// - `subject` - ID of the record the operation concerns, e.g. a user or interest ID
    /// - `payload` - Everything needed to replay the operation
    /// - `status` - Outcome of the attempt
    /// - `detail` - Skip reason or error message
    pub async fn append(
        &self,
        operation: Operation,
        subject: &str,
        payload: Value,
        status: LogStatus,
        detail: Option<String>,
    ) -> Result<ReconciliationLogModel, DbErr> {
        let now = Utc::now().naive_utc();
        let entry = entity::reconciliation_log::ActiveModel {
            operation: ActiveValue::Set(operation.as_str().to_string()),
            subject: ActiveValue::Set(subject.to_string()),
            payload: ActiveValue::Set(payload),
            status: ActiveValue::Set(status.as_str().to_string()),
            detail: ActiveValue::Set(detail),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };

        entry.insert(self.db).await
    }

    /// Records an outcome for `subject`, reusing its open entry when there is one
    ///
    /// An entry is open while it is `pending`, `skipped` or `failed`. Repeated attempts at the
    /// same operation therefore leave a single entry to replay, carrying the latest payload,
    /// status and detail. Without an open entry a new one is appended.
    ///
    /// # Returns
    /// - `Ok(model)` - The updated or appended entry
    /// - `Err(DbErr)` - The log could not be read or written
    pub async fn record(
        &self,
        operation: Operation,
        subject: &str,
        payload: Value,
        status: LogStatus,
        detail: Option<String>,
    ) -> Result<ReconciliationLogModel, DbErr> {
        let open = entity::prelude::ReconciliationLog::find()
            .filter(entity::reconciliation_log::Column::Operation.eq(operation.as_str()))
            .filter(entity::reconciliation_log::Column::Subject.eq(subject))
            .filter(entity::reconciliation_log::Column::Status.is_in([
                LogStatus::Pending.as_str(),
                LogStatus::Skipped.as_str(),
                LogStatus::Failed.as_str(),
            ]))
            .order_by_desc(entity::reconciliation_log::Column::Id)
            .one(self.db)
            .await?;

        let Some(entry) = open else {
            return self
                .append(operation, subject, payload, status, detail)
                .await;
        };

        let mut entry_am = entry.into_active_model();
        entry_am.payload = ActiveValue::Set(payload);
        entry_am.status = ActiveValue::Set(status.as_str().to_string());
        entry_am.detail = ActiveValue::Set(detail);
        entry_am.updated_at = ActiveValue::Set(Utc::now().naive_utc());

        entry_am.update(self.db).await
    }

    /// Entries with any of `statuses`, oldest first
    pub async fn with_status(
        &self,
        statuses: &[LogStatus],
    ) -> Result<Vec<ReconciliationLogModel>, DbErr> {
        entity::prelude::ReconciliationLog::find()
            .filter(
                entity::reconciliation_log::Column::Status
                    .is_in(statuses.iter().map(LogStatus::as_str)),
            )
            .order_by_asc(entity::reconciliation_log::Column::Id)
            .all(self.db)
            .await
    }

    pub async fn all(&self) -> Result<Vec<ReconciliationLogModel>, DbErr> {
        entity::prelude::ReconciliationLog::find()
            .order_by_asc(entity::reconciliation_log::Column::Id)
            .all(self.db)
            .await
    }

    /// Moves an entry to a new status
    ///
    /// # Returns
    /// - `Ok(Some(model))` - The updated entry
    /// - `Ok(None)` - No entry has this ID
    pub async fn update_status(
        &self,
        id: i32,
        status: LogStatus,
        detail: Option<String>,
    ) -> Result<Option<ReconciliationLogModel>, DbErr> {
        let entry = match entity::prelude::ReconciliationLog::find_by_id(id)
            .one(self.db)
            .await?
        {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let mut entry_am = entry.into_active_model();
        entry_am.status = ActiveValue::Set(status.as_str().to_string());
        entry_am.detail = ActiveValue::Set(detail);
        entry_am.updated_at = ActiveValue::Set(Utc::now().naive_utc());

        let entry = entry_am.update(self.db).await?;

        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    mod append {
        use campus_sync_test_utils::prelude::*;
        use serde_json::json;

        use crate::{
            data::relational::reconciliation_log::ReconciliationLogRepository,
            model::reconciliation::{LogStatus, Operation},
        };

        /// Expect success when appending an entry
        #[tokio::test]
        async fn appends_entry() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let repo = ReconciliationLogRepository::new(&test.db);

            let entry = repo
                .append(
                    Operation::MigrateUser,
                    "u1",
                    json!({ "userId": "u1" }),
                    LogStatus::Skipped,
                    Some("institution inst9 not found".to_string()),
                )
                .await?;

            assert_eq!(entry.operation, "migrate_user");
            assert_eq!(entry.status, "skipped");
            assert_eq!(entry.payload, json!({ "userId": "u1" }));

            Ok(())
        }

        /// Expect Error when the log table does not exist
        #[tokio::test]
        async fn fails_when_tables_missing() -> Result<(), TestError> {
            let test = TestBuilder::new().build().await?;
            let repo = ReconciliationLogRepository::new(&test.db);

            let result = repo
                .append(
                    Operation::MigrateUser,
                    "u1",
                    json!({}),
                    LogStatus::Failed,
                    None,
                )
                .await;

            assert!(result.is_err());

            Ok(())
        }
    }

    mod record {
        use campus_sync_test_utils::prelude::*;
        use serde_json::json;

        use crate::{
            data::relational::reconciliation_log::ReconciliationLogRepository,
            model::reconciliation::{LogStatus, Operation},
        };

        /// Expect a repeated outcome for the same subject to update its open entry
        #[tokio::test]
        async fn reuses_open_entry() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let repo = ReconciliationLogRepository::new(&test.db);

            let first = repo
                .record(
                    Operation::MigrateUser,
                    "u1",
                    json!({ "userId": "u1" }),
                    LogStatus::Skipped,
                    Some("institution inst9 not found".to_string()),
                )
                .await?;
            let second = repo
                .record(
                    Operation::MigrateUser,
                    "u1",
                    json!({ "userId": "u1", "user": { "role": "student" } }),
                    LogStatus::Failed,
                    Some("timeout".to_string()),
                )
                .await?;

            assert_eq!(second.id, first.id);
            assert_eq!(second.status, "failed");
            assert_eq!(second.detail.as_deref(), Some("timeout"));
            assert_eq!(second.payload["user"]["role"], json!("student"));
            assert_eq!(repo.all().await?.len(), 1);

            Ok(())
        }

        /// Expect a new entry once the previous one is applied, and per operation
        #[tokio::test]
        async fn appends_after_closed_entry() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let repo = ReconciliationLogRepository::new(&test.db);
            let applied = repo
                .append(Operation::MigrateUser, "u1", json!({}), LogStatus::Applied, None)
                .await?;

            let migration = repo
                .record(Operation::MigrateUser, "u1", json!({}), LogStatus::Skipped, None)
                .await?;
            let repair = repo
                .record(
                    Operation::MarkInterestProcessed,
                    "u1",
                    json!({}),
                    LogStatus::Failed,
                    None,
                )
                .await?;

            assert_ne!(migration.id, applied.id);
            assert_ne!(repair.id, migration.id);
            assert_eq!(repo.all().await?.len(), 3);

            Ok(())
        }
    }

    mod update_status {
        use campus_sync_test_utils::prelude::*;
        use serde_json::json;

        use crate::{
            data::relational::reconciliation_log::ReconciliationLogRepository,
            model::reconciliation::{LogStatus, Operation},
        };

        /// Expect the entry to leave the replay queue once applied
        #[tokio::test]
        async fn moves_entry_out_of_status_filter() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let repo = ReconciliationLogRepository::new(&test.db);
            let entry = repo
                .append(
                    Operation::MarkInterestProcessed,
                    "i1",
                    json!({ "interestId": "i1" }),
                    LogStatus::Failed,
                    None,
                )
                .await?;

            let updated = repo
                .update_status(entry.id, LogStatus::Applied, None)
                .await?;

            assert_eq!(updated.map(|e| e.status), Some("applied".to_string()));
            let failed = repo
                .with_status(&[LogStatus::Failed, LogStatus::Skipped])
                .await?;
            assert!(failed.is_empty());

            Ok(())
        }

        /// Expect Ok(None) for an unknown entry ID
        #[tokio::test]
        async fn returns_none_for_unknown_entry() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let repo = ReconciliationLogRepository::new(&test.db);

            let result = repo.update_status(42, LogStatus::Applied, None).await;

            assert!(matches!(result, Ok(None)));

            Ok(())
        }
    }
}
