use std::fmt;

use docstore::{DocumentStore, Fields};
use sea_orm::DatabaseConnection;
use serde_json::Value;

use crate::{
    data::{
        document::{interest::InterestRepository, legacy_user::LegacyUserRepository},
        relational::reconciliation_log::ReconciliationLogRepository,
    },
    error::Error,
    model::{
        db::ReconciliationLogModel,
        reconciliation::{LogStatus, Operation},
    },
    service::migration::{MigrationOutcome, MigrationService},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Entries with an unknown operation, left untouched.
    pub ignored: usize,
}

impl ReplayReport {
    pub fn replayed(&self) -> usize {
        self.applied + self.skipped + self.failed
    }
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Replayed {} entr(ies): {} applied, {} still skipped, {} failed, {} ignored",
            self.replayed(),
            self.applied,
            self.skipped,
            self.failed,
            self.ignored
        )
    }
}

/// Re-runs reconciliation log entries that were skipped or failed.
pub struct ReplayService<'a> {
    store: &'a dyn DocumentStore,
    db: &'a DatabaseConnection,
    signup_base_url: &'a str,
}

impl<'a> ReplayService<'a> {
    /// Creates a new instance of [`ReplayService`]
    pub fn new(
        store: &'a dyn DocumentStore,
        db: &'a DatabaseConnection,
        signup_base_url: &'a str,
    ) -> Self {
        Self {
            store,
            db,
            signup_base_url,
        }
    }

    /// Replays every `skipped` or `failed` entry, oldest first, and moves each to its new status
    ///
    /// User migrations re-read the legacy user document, falling back to the copy kept in
    /// the entry payload. Interest repairs re-apply the recorded link.
    ///
    /// # Returns
    /// - `Ok(ReplayReport)` - Counts per new status
    /// - `Err(Error)` - The reconciliation log could not be read or updated
    pub async fn run(&self) -> Result<ReplayReport, Error> {
        let log = ReconciliationLogRepository::new(self.db);
        let entries = log
            .with_status(&[LogStatus::Skipped, LogStatus::Failed])
            .await?;
        let mut report = ReplayReport::default();

        tracing::info!("Replaying {} reconciliation log entr(ies)", entries.len());

        for entry in entries {
            let Some(operation) = Operation::parse(&entry.operation) else {
                tracing::warn!(
                    "Ignoring log entry {} with unknown operation {:?}",
                    entry.id,
                    entry.operation
                );
                report.ignored += 1;
                continue;
            };

            let (status, detail) = match operation {
                Operation::MigrateUser => self.replay_migration(&entry).await,
                Operation::MarkInterestProcessed => self.replay_interest(&entry).await,
            };

            match status {
                LogStatus::Applied => report.applied += 1,
                LogStatus::Skipped => report.skipped += 1,
                LogStatus::Failed | LogStatus::Pending => report.failed += 1,
            }
            tracing::debug!("Log entry {} ({}) is now {}", entry.id, operation, status);

            log.update_status(entry.id, status, detail).await?;
        }

        Ok(report)
    }

    async fn replay_migration(&self, entry: &ReconciliationLogModel) -> (LogStatus, Option<String>) {
        let uid = payload_str(&entry.payload, "userId").unwrap_or(entry.subject.as_str());

        let fields = match self.source_user(uid, &entry.payload).await {
            Ok(Some(fields)) => fields,
            Ok(None) => {
                return (
                    LogStatus::Failed,
                    Some(format!("source document for user {uid} not found")),
                )
            }
            Err(e) => return (LogStatus::Failed, Some(e.to_string())),
        };

        let migration = MigrationService::new(self.store, self.db, self.signup_base_url);
        match migration.migrate_user(uid, &fields).await {
            Ok(MigrationOutcome::Migrated { placement, .. }) => {
                tracing::info!("Replayed migration of user {} as {}", uid, placement);
                (LogStatus::Applied, None)
            }
            Ok(MigrationOutcome::Skipped(reason)) => {
                tracing::warn!("User {} still skipped: {}", uid, reason);
                (LogStatus::Skipped, Some(reason.to_string()))
            }
            Err(e) => {
                tracing::error!("Replay of user {} failed: {}", uid, e);
                (LogStatus::Failed, Some(e.to_string()))
            }
        }
    }

    async fn source_user(&self, uid: &str, payload: &Value) -> Result<Option<Fields>, Error> {
        if let Some(document) = LegacyUserRepository::new(self.store).get(uid).await? {
            return Ok(Some(document.fields));
        }

        Ok(payload.get("user").and_then(Value::as_object).cloned())
    }

    async fn replay_interest(&self, entry: &ReconciliationLogModel) -> (LogStatus, Option<String>) {
        let interest_id = payload_str(&entry.payload, "interestId").unwrap_or(entry.subject.as_str());
        let (Some(user_id), Some(institution_id)) = (
            payload_str(&entry.payload, "userId"),
            payload_str(&entry.payload, "institutionId"),
        ) else {
            return (
                LogStatus::Failed,
                Some("payload lacks userId or institutionId".to_string()),
            );
        };

        match InterestRepository::new(self.store)
            .mark_processed(interest_id, user_id, institution_id)
            .await
        {
            Ok(()) => (LogStatus::Applied, None),
            Err(e) => {
                tracing::error!("Replay of submission {} failed: {}", interest_id, e);
                (LogStatus::Failed, Some(e.to_string()))
            }
        }
    }
}

fn payload_str<'v>(payload: &'v Value, key: &str) -> Option<&'v str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    mod run {
        use campus_sync_test_utils::prelude::*;
        use serde_json::json;

        use crate::{
            data::relational::reconciliation_log::ReconciliationLogRepository,
            model::reconciliation::{LogStatus, Operation},
            service::{migration::MigrationService, replay::ReplayService},
        };

        /// Expect a skipped user to be applied once its institution exists
        #[tokio::test]
        async fn applies_user_once_institution_exists() -> Result<(), TestError> {
            let test = TestBuilder::new()
                .with_relational_tables()
                .with_legacy_user("u1", factory::affiliated_user("a@state.edu", "admin", "inst1", None))
                .with_legacy_user(
                    "u2",
                    factory::affiliated_user("b@state.edu", "institution_admin", "inst1", None),
                )
                .build()
                .await?;
            let base = "http://localhost:5173";

            let report = MigrationService::new(test.store(), &test.db, base)
                .migrate_all_data()
                .await
                .unwrap();
            assert_eq!(report.skipped, 2);

            test.documents()
                .insert_institution("inst1", factory::legacy_institution("State University", None))
                .await?;

            let replay = ReplayService::new(test.store(), &test.db, base)
                .run()
                .await
                .unwrap();

            assert_eq!(replay.applied, 1);
            assert_eq!(replay.skipped, 1);
            assert!(test.documents().fields("institutions/inst1/admins/u2").await?.is_some());

            let entries = ReconciliationLogRepository::new(&test.db).all().await?;
            let statuses: Vec<(&str, &str)> = entries
                .iter()
                .map(|entry| (entry.subject.as_str(), entry.status.as_str()))
                .collect();
            assert_eq!(statuses, vec![("u1", "skipped"), ("u2", "applied")]);

            Ok(())
        }

        /// Expect the payload copy to be used when the legacy document is gone
        #[tokio::test]
        async fn falls_back_to_payload_copy() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            ReconciliationLogRepository::new(&test.db)
                .append(
                    Operation::MigrateUser,
                    "u9",
                    json!({ "userId": "u9", "user": factory::legacy_user("x@gmail.com", "teacher") }),
                    LogStatus::Failed,
                    Some("timeout".to_string()),
                )
                .await?;

            let replay = ReplayService::new(test.store(), &test.db, "http://localhost:5173")
                .run()
                .await
                .unwrap();

            assert_eq!(replay.applied, 1);
            assert!(test.documents().fields("externalUsers/u9").await?.is_some());

            Ok(())
        }

        /// Expect interest repairs to be re-applied and unknown operations left alone
        #[tokio::test]
        async fn replays_interest_repairs() -> Result<(), TestError> {
            let test = TestBuilder::new()
                .with_relational_tables()
                .with_interest("i1", factory::interest("State University", "dean@state.edu", "pending"))
                .build()
                .await?;
            let log = ReconciliationLogRepository::new(&test.db);
            log.append(
                Operation::MarkInterestProcessed,
                "i1",
                json!({ "interestId": "i1", "userId": "a1", "institutionId": "inst1" }),
                LogStatus::Failed,
                None,
            )
            .await?;
            log.append(
                Operation::MarkInterestProcessed,
                "i2",
                json!({ "interestId": "i2" }),
                LogStatus::Failed,
                None,
            )
            .await?;

            let replay = ReplayService::new(test.store(), &test.db, "http://localhost:5173")
                .run()
                .await
                .unwrap();

            assert_eq!(replay.applied, 1);
            assert_eq!(replay.failed, 1);
            let fields = test
                .documents()
                .fields("institution_interests/i1")
                .await?
                .unwrap();
            assert_eq!(fields["status"], json!("processed"));
            assert_eq!(fields["userId"], json!("a1"));

            Ok(())
        }
    }
}
