//! Migration of the flat `institutions` and `users` collections into the hierarchy.

use std::{collections::BTreeMap, fmt};

use docstore::{id::random_token, DocumentStore, Fields};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

use crate::{
    data::{
        document::{
            department::DepartmentRepository, institution::InstitutionDocRepository,
            legacy_user::LegacyUserRepository, member::MemberRepository,
        },
        relational::reconciliation_log::ReconciliationLogRepository,
    },
    error::Error,
    model::{
        department::DEFAULT_DEPARTMENT_NAME,
        institution::ApprovalStatus,
        placement::{ExternalRole, Placement},
        reconciliation::{LogStatus, Operation},
        role::Role,
        user::UserRecord,
    },
    util::time::now_rfc3339,
};

const SIGNUP_TOKEN_LEN: usize = 32;

/// Why a legacy user was left where it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The `role` field is missing or not one of the four platform roles.
    UnknownRole(Option<String>),
    /// An institution admin without `institutionId` has nowhere to go.
    AdminWithoutInstitution,
    /// `institutionId` names no document in `institutions`.
    InstitutionNotFound(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRole(Some(role)) => write!(f, "unknown role {role:?}"),
            Self::UnknownRole(None) => write!(f, "no role"),
            Self::AdminWithoutInstitution => write!(f, "institution admin without institutionId"),
            Self::InstitutionNotFound(id) => write!(f, "institution {id} not found"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Migrated {
        placement: Placement,
        department_created: bool,
    },
    Skipped(SkipReason),
}

/// Summary of a [`MigrationService::migrate_all_data`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub institutions_migrated: usize,
    pub platform_admins: usize,
    pub external_users: usize,
    pub institution_admins: usize,
    pub teachers: usize,
    pub students: usize,
    pub departments_created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl MigrationReport {
    pub fn users_migrated(&self) -> usize {
        self.platform_admins
            + self.external_users
            + self.institution_admins
            + self.teachers
            + self.students
    }

    fn record(&mut self, placement: &Placement, department_created: bool) {
        match placement {
            Placement::PlatformAdmin => self.platform_admins += 1,
            Placement::External { .. } => self.external_users += 1,
            Placement::InstitutionAdmin { .. } => self.institution_admins += 1,
            Placement::Teacher { .. } => self.teachers += 1,
            Placement::Student { .. } => self.students += 1,
        }
        if department_created {
            self.departments_created += 1;
        }
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Migration summary")?;
        writeln!(f, "  institutions migrated: {}", self.institutions_migrated)?;
        writeln!(f, "  users migrated:        {}", self.users_migrated())?;
        writeln!(f, "    platform admins:     {}", self.platform_admins)?;
        writeln!(f, "    external users:      {}", self.external_users)?;
        writeln!(f, "    institution admins:  {}", self.institution_admins)?;
        writeln!(f, "    teachers:            {}", self.teachers)?;
        writeln!(f, "    students:            {}", self.students)?;
        writeln!(f, "  departments created:   {}", self.departments_created)?;
        writeln!(f, "  users skipped:         {}", self.skipped)?;
        write!(f, "  users failed:          {}", self.failed)
    }
}

/// Sizes of the source collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStats {
    pub institutions: usize,
    pub users: usize,
    pub users_by_role: BTreeMap<Role, usize>,
    pub unknown_roles: usize,
}

impl fmt::Display for MigrationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source collections")?;
        writeln!(f, "  institutions: {}", self.institutions)?;
        writeln!(f, "  users:        {}", self.users)?;
        for role in Role::ALL {
            let count = self.users_by_role.get(&role).copied().unwrap_or(0);
            writeln!(f, "    {:<18} {}", role.as_str(), count)?;
        }
        write!(f, "    {:<18} {}", "unknown", self.unknown_roles)
    }
}

pub struct MigrationService<'a> {
    store: &'a dyn DocumentStore,
    db: &'a DatabaseConnection,
    signup_base_url: &'a str,
}

impl<'a> MigrationService<'a> {
    /// Creates a new instance of [`MigrationService`]
    ///
    /// # Arguments
    /// - `store` - Document store holding both the flat collections and the hierarchy
    /// - `db` - Relational database holding the reconciliation log
    /// - `signup_base_url` - Base of generated institution signup links
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

    /// Migrates every institution, then every legacy user
    ///
    /// Institutions are merged in place on their document ID, so re-running is safe.
    /// Users are written to paths derived from their ID. A user that cannot be placed is
    /// skipped, a user whose migration fails is counted as failed; both are recorded in the
    /// reconciliation log, one open entry per user, and neither stops the batch.
    ///
    /// # Returns
    /// - `Ok(MigrationReport)` - Counts per outcome
    /// - `Err(Error)` - A collection could not be listed or an institution could not be
    ///   written
    pub async fn migrate_all_data(&self) -> Result<MigrationReport, Error> {
        let mut report = MigrationReport::default();

        report.institutions_migrated = self.migrate_institutions().await?;
        tracing::info!("Migrated {} institution(s)", report.institutions_migrated);

        let users = LegacyUserRepository::new(self.store).list().await?;
        tracing::info!("Migrating {} user(s)", users.len());

        for document in users {
            let uid = document.id().to_string();

            match self.migrate_user(&uid, &document.fields).await {
                Ok(MigrationOutcome::Migrated {
                    placement,
                    department_created,
                }) => {
                    tracing::debug!("Migrated user {} as {}", uid, placement);
                    report.record(&placement, department_created);
                }
                Ok(MigrationOutcome::Skipped(reason)) => {
                    tracing::warn!("Skipping user {}: {}", uid, reason);
                    report.skipped += 1;
                    self.log_user_outcome(&uid, &document.fields, LogStatus::Skipped, reason.to_string())
                        .await;
                }
                Err(e) => {
                    tracing::error!("Failed to migrate user {}: {}", uid, e);
                    report.failed += 1;
                    self.log_user_outcome(&uid, &document.fields, LogStatus::Failed, e.to_string())
                        .await;
                }
            }
        }

        tracing::info!(
            "Migrated {} user(s), skipped {}, failed {}",
            report.users_migrated(),
            report.skipped,
            report.failed
        );

        Ok(report)
    }

    /// Fills the hierarchy fields missing from every institution document
    ///
    /// # Returns
    /// - `Ok(usize)` - Number of institutions written
    /// - `Err(Error)` - Listing or writing failed
    pub async fn migrate_institutions(&self) -> Result<usize, Error> {
        let repo = InstitutionDocRepository::new(self.store);
        let documents = repo.list_documents().await?;
        let now = now_rfc3339();

        for document in &documents {
            let patch = institution_defaults(&document.fields, self.signup_base_url, &now);
            repo.merge(document.id(), patch).await?;
        }

        Ok(documents.len())
    }

    /// Places one legacy user into the hierarchy
    ///
    /// # Arguments
    /// - `uid` - Document ID of the user, reused as its ID in the hierarchy
    /// - `fields` - Fields of the legacy `users/{uid}` document
    ///
    /// # Returns
    /// - `Ok(MigrationOutcome::Migrated)` - The user document was written
    /// - `Ok(MigrationOutcome::Skipped)` - The user cannot be placed
    /// - `Err(Error)` - The document is malformed or a store operation failed
    pub async fn migrate_user(&self, uid: &str, fields: &Fields) -> Result<MigrationOutcome, Error> {
        let user: UserRecord = serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|e| Error::invalid_record(format!("users/{uid}"), e.to_string()))?;

        let Some(role) = user.parsed_role() else {
            return Ok(MigrationOutcome::Skipped(SkipReason::UnknownRole(user.role)));
        };

        let departments = DepartmentRepository::new(self.store);
        let mut department_created = false;
        let mut department_teacher: Option<Option<String>> = None;

        let placement = match (role, user.institution()) {
            (Role::PlatformAdmin, institution) => {
                if let Some(institution_id) = institution {
                    tracing::warn!(
                        "Dropping institutionId {} from platform admin {}",
                        institution_id,
                        uid
                    );
                }
                Placement::PlatformAdmin
            }
            (Role::Student, None) => Placement::External {
                role: ExternalRole::Student,
            },
            (Role::Teacher, None) => Placement::External {
                role: ExternalRole::Teacher,
            },
            (Role::InstitutionAdmin, None) => {
                return Ok(MigrationOutcome::Skipped(SkipReason::AdminWithoutInstitution));
            }
            (role, Some(institution_id)) => {
                if !InstitutionDocRepository::new(self.store)
                    .exists(institution_id)
                    .await?
                {
                    return Ok(MigrationOutcome::Skipped(SkipReason::InstitutionNotFound(
                        institution_id.to_string(),
                    )));
                }

                let institution_id = institution_id.to_string();
                match role {
                    Role::InstitutionAdmin => Placement::InstitutionAdmin { institution_id },
                    Role::Teacher | Role::Student => {
                        let name = user.department_name().unwrap_or(DEFAULT_DEPARTMENT_NAME);
                        let (department, created) =
                            departments.find_or_create(&institution_id, name).await?;
                        department_created = created;
                        department_teacher = Some(department.doc.teacher_id.clone());

                        if role == Role::Teacher {
                            Placement::Teacher {
                                institution_id,
                                department_id: department.id,
                            }
                        } else {
                            Placement::Student {
                                institution_id,
                                department_id: department.id,
                            }
                        }
                    }
                    Role::PlatformAdmin => {
                        return Err(Error::InternalError(
                            "platform admins are placed before institution lookup".to_string(),
                        ));
                    }
                }
            }
        };

        let members = MemberRepository::new(self.store);
        let already_placed = members.exists(&placement, uid).await?;
        members
            .put(&placement, uid, member_fields(fields, &placement))
            .await?;

        match &placement {
            Placement::Student {
                institution_id,
                department_id,
            } if !already_placed => {
                departments
                    .increment_student_count(institution_id, department_id)
                    .await?;
            }
            Placement::Teacher {
                institution_id,
                department_id,
            } if matches!(department_teacher, Some(None)) => {
                departments
                    .set_teacher(institution_id, department_id, uid)
                    .await?;
            }
            _ => {}
        }

        Ok(MigrationOutcome::Migrated {
            placement,
            department_created,
        })
    }

    /// Re-counts the source collections without checking the hierarchy
    pub async fn migration_stats(&self) -> Result<MigrationStats, Error> {
        let institutions = InstitutionDocRepository::new(self.store)
            .list_documents()
            .await?;
        let users = LegacyUserRepository::new(self.store).list().await?;

        let mut stats = MigrationStats {
            institutions: institutions.len(),
            users: users.len(),
            ..Default::default()
        };

        for document in &users {
            match document.str_field("role").and_then(Role::parse) {
                Some(role) => *stats.users_by_role.entry(role).or_insert(0) += 1,
                None => stats.unknown_roles += 1,
            }
        }

        Ok(stats)
    }

    async fn log_user_outcome(&self, uid: &str, fields: &Fields, status: LogStatus, detail: String) {
        let payload = json!({ "userId": uid, "user": fields });
        let result = ReconciliationLogRepository::new(self.db)
            .record(Operation::MigrateUser, uid, payload, status, Some(detail))
            .await;

        if let Err(e) = result {
            tracing::error!("Failed to record migration outcome for user {}: {}", uid, e);
        }
    }
}

/// Fields to merge into an institution document so it carries everything the hierarchy
/// requires. Present, non-empty values are never replaced; `updatedAt` always is.
pub fn institution_defaults(fields: &Fields, signup_base_url: &str, now: &str) -> Fields {
    let mut patch = Fields::new();
    let present = |key: &str| match fields.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    };

    let token = match fields
        .get("customSignupToken")
        .and_then(Value::as_str)
        .filter(|token| !token.trim().is_empty())
    {
        Some(token) => token.to_string(),
        None => {
            let token = random_token(SIGNUP_TOKEN_LEN);
            patch.insert("customSignupToken".to_string(), json!(token));
            token
        }
    };

    if !present("customSignupLink") {
        patch.insert(
            "customSignupLink".to_string(),
            json!(format!("{signup_base_url}/signup/{token}")),
        );
    }
    if !present("approvalStatus") {
        patch.insert(
            "approvalStatus".to_string(),
            json!(ApprovalStatus::Approved.as_str()),
        );
    }
    if !present("isActive") {
        patch.insert("isActive".to_string(), json!(true));
    }
    if !present("createdAt") {
        patch.insert("createdAt".to_string(), json!(now));
    }
    patch.insert("updatedAt".to_string(), json!(now));

    patch
}

/// The legacy document with its role and institution links rewritten to match `placement`.
fn member_fields(fields: &Fields, placement: &Placement) -> Fields {
    let mut member = fields.clone();
    member.remove("institutionId");
    member.remove("departmentId");
    member.insert("role".to_string(), json!(placement.role().as_str()));

    if let Some(institution_id) = placement.institution_id() {
        member.insert("institutionId".to_string(), json!(institution_id));
    }
    if let Some(department_id) = placement.department_id() {
        member.insert("departmentId".to_string(), json!(department_id));
    }

    member
}

#[cfg(test)]
mod tests {
    mod institution_defaults {
        use serde_json::json;

        use crate::service::migration::institution_defaults;

        /// Expect every missing hierarchy field to be filled
        #[test]
        fn fills_missing_fields() {
            let fields = json!({ "name": "State University" })
                .as_object()
                .cloned()
                .unwrap();

            let patch = institution_defaults(&fields, "https://app.example.com", "now");

            let token = patch["customSignupToken"].as_str().unwrap();
            assert_eq!(token.len(), 32);
            assert_eq!(
                patch["customSignupLink"],
                json!(format!("https://app.example.com/signup/{token}"))
            );
            assert_eq!(patch["approvalStatus"], json!("approved"));
            assert_eq!(patch["isActive"], json!(true));
            assert_eq!(patch["createdAt"], json!("now"));
            assert!(patch.get("name").is_none());
        }

        /// Expect existing values to survive, including a deliberate `isActive: false`
        #[test]
        fn never_overwrites_existing_values() {
            let fields = json!({
                "name": "State University",
                "customSignupToken": "tok",
                "approvalStatus": "pending",
                "isActive": false,
                "createdAt": "2024-01-01T00:00:00Z"
            })
            .as_object()
            .cloned()
            .unwrap();

            let patch = institution_defaults(&fields, "http://localhost:5173", "now");

            assert_eq!(patch["customSignupLink"], json!("http://localhost:5173/signup/tok"));
            assert!(patch.get("customSignupToken").is_none());
            assert!(patch.get("approvalStatus").is_none());
            assert!(patch.get("isActive").is_none());
            assert!(patch.get("createdAt").is_none());
            assert_eq!(patch["updatedAt"], json!("now"));
        }
    }

    mod migrate_user {
        use campus_sync_test_utils::prelude::*;
        use serde_json::json;

        use crate::{
            model::placement::{ExternalRole, Placement},
            service::migration::{MigrationOutcome, MigrationService, SkipReason},
        };

        fn fields(value: serde_json::Value) -> docstore::Fields {
            value.as_object().cloned().unwrap()
        }

        /// Expect a user without institution to become an external user
        #[tokio::test]
        async fn places_unaffiliated_student_as_external() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");

            let outcome = service
                .migrate_user("u1", &fields(factory::legacy_user("a@gmail.com", "student")))
                .await;

            assert_eq!(
                outcome.unwrap(),
                MigrationOutcome::Migrated {
                    placement: Placement::External {
                        role: ExternalRole::Student
                    },
                    department_created: false,
                }
            );
            assert!(test.documents().fields("externalUsers/u1").await?.is_some());

            Ok(())
        }

        /// Expect institutionId to be stripped from platform admins
        #[tokio::test]
        async fn drops_institution_from_platform_admin() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");

            service
                .migrate_user(
                    "root",
                    &fields(factory::affiliated_user("ops@platform.io", "platform_admin", "inst1", None)),
                )
                .await
                .unwrap();

            let stored = test.documents().fields("platformAdmins/root").await?.unwrap();
            assert!(stored.get("institutionId").is_none());
            assert_eq!(stored["role"], json!("platform_admin"));

            Ok(())
        }

        /// Expect a skip when the referenced institution does not exist
        #[tokio::test]
        async fn skips_user_of_unknown_institution() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");

            let outcome = service
                .migrate_user(
                    "u1",
                    &fields(factory::affiliated_user("a@x.edu", "teacher", "ghost", None)),
                )
                .await
                .unwrap();

            assert_eq!(
                outcome,
                MigrationOutcome::Skipped(SkipReason::InstitutionNotFound("ghost".to_string()))
            );
            assert_eq!(test.documents().count("institutions/ghost/departments").await?, 0);

            Ok(())
        }

        #[tokio::test]
        async fn skips_admin_without_institution_and_unknown_roles() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");

            let admin = service
                .migrate_user("a1", &fields(factory::legacy_user("a@x.edu", "institution_admin")))
                .await
                .unwrap();
            let unknown = service
                .migrate_user("a2", &fields(factory::legacy_user("b@x.edu", "janitor")))
                .await
                .unwrap();

            assert_eq!(
                admin,
                MigrationOutcome::Skipped(SkipReason::AdminWithoutInstitution)
            );
            assert_eq!(
                unknown,
                MigrationOutcome::Skipped(SkipReason::UnknownRole(Some("janitor".to_string())))
            );

            Ok(())
        }

        /// Expect a malformed document to be an error rather than a skip
        #[tokio::test]
        async fn fails_for_malformed_user() -> Result<(), TestError> {
            let test = TestBuilder::new().with_relational_tables().build().await?;
            let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");

            let result = service
                .migrate_user("u1", &fields(json!({ "email": 7, "role": "student" })))
                .await;

            assert!(result.is_err());

            Ok(())
        }

        /// Expect the first teacher to become the department teacher and students to be counted once
        #[tokio::test]
        async fn updates_department_teacher_and_student_count() -> Result<(), TestError> {
            let test = TestBuilder::new()
                .with_relational_tables()
                .with_institution_document("inst1", factory::legacy_institution("State University", Some("state.edu")))
                .build()
                .await?;
            let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");
            let student = fields(factory::affiliated_user("s@state.edu", "student", "inst1", Some("CS")));

            let teacher = service
                .migrate_user(
                    "t1",
                    &fields(factory::affiliated_user("t1@state.edu", "teacher", "inst1", Some("CS"))),
                )
                .await
                .unwrap();
            service
                .migrate_user(
                    "t2",
                    &fields(factory::affiliated_user("t2@state.edu", "teacher", "inst1", Some("CS"))),
                )
                .await
                .unwrap();
            service.migrate_user("s1", &student).await.unwrap();
            service.migrate_user("s1", &student).await.unwrap();

            let MigrationOutcome::Migrated {
                placement: Placement::Teacher { department_id, .. },
                department_created: true,
            } = teacher
            else {
                panic!("expected the first teacher to create the department, got {teacher:?}");
            };
            let department = test
                .documents()
                .fields(&format!("institutions/inst1/departments/{department_id}"))
                .await?
                .unwrap();
            assert_eq!(department["teacherId"], json!("t1"));
            assert_eq!(department["studentCount"], json!(1));

            Ok(())
        }
    }

    mod migrate_all_data {
        use campus_sync_test_utils::prelude::*;
        use sea_orm::EntityTrait;

        use crate::service::migration::MigrationService;

        /// Expect skips and failures to be counted and logged without aborting the batch
        #[tokio::test]
        async fn records_skips_and_failures() -> Result<(), TestError> {
            let test = TestBuilder::new()
                .with_relational_tables()
                .with_institution_document("inst1", factory::legacy_institution("State University", None))
                .with_legacy_user("u1", factory::affiliated_user("a@state.edu", "student", "inst1", None))
                .with_legacy_user("u2", factory::affiliated_user("b@x.edu", "student", "ghost", None))
                .with_legacy_user("u3", serde_json::json!({ "email": ["not", "a", "string"], "role": "teacher" }))
                .with_legacy_user("u4", factory::legacy_user("c@gmail.com", "teacher"))
                .build()
                .await?;
            let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");

            let report = service.migrate_all_data().await.unwrap();

            assert_eq!(report.institutions_migrated, 1);
            assert_eq!(report.students, 1);
            assert_eq!(report.external_users, 1);
            assert_eq!(report.departments_created, 1);
            assert_eq!(report.skipped, 1);
            assert_eq!(report.failed, 1);

            let log = entity::prelude::ReconciliationLog::find().all(&test.db).await?;
            let mut subjects: Vec<(String, String)> = log
                .into_iter()
                .map(|entry| (entry.subject, entry.status))
                .collect();
            subjects.sort();
            assert_eq!(
                subjects,
                vec![
                    ("u2".to_string(), "skipped".to_string()),
                    ("u3".to_string(), "failed".to_string())
                ]
            );

            Ok(())
        }

        /// Expect a re-run to keep one open log entry per unplaceable user
        #[tokio::test]
        async fn rerun_keeps_one_entry_per_skipped_user() -> Result<(), TestError> {
            let test = TestBuilder::new()
                .with_relational_tables()
                .with_legacy_user("u1", factory::affiliated_user("b@x.edu", "student", "ghost", None))
                .build()
                .await?;
            let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");

            service.migrate_all_data().await.unwrap();
            let report = service.migrate_all_data().await.unwrap();

            assert_eq!(report.skipped, 1);
            let log = entity::prelude::ReconciliationLog::find().all(&test.db).await?;
            assert_eq!(log.len(), 1);
            assert_eq!(log[0].subject, "u1");
            assert_eq!(log[0].status, "skipped");

            Ok(())
        }
    }

    mod migration_stats {
        use campus_sync_test_utils::prelude::*;

        use crate::{model::role::Role, service::migration::MigrationService};

        #[tokio::test]
        async fn counts_users_per_role() -> Result<(), TestError> {
            let test = TestBuilder::new()
                .with_institution_document("inst1", factory::legacy_institution("State University", None))
                .with_legacy_user("u1", factory::legacy_user("a@x.edu", "student"))
                .with_legacy_user("u2", factory::legacy_user("b@x.edu", "student"))
                .with_legacy_user("u3", factory::legacy_user("c@x.edu", "wizard"))
                .build()
                .await?;
            let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");

            let stats = service.migration_stats().await.unwrap();

            assert_eq!(stats.institutions, 1);
            assert_eq!(stats.users, 3);
            assert_eq!(stats.users_by_role.get(&Role::Student), Some(&2));
            assert_eq!(stats.unknown_roles, 1);

            Ok(())
        }
    }
}
