//! Tests for MigrationService::migrate_all_data.
//!
//! This module verifies that institution migration is idempotent, that every placeable
//! user lands in exactly one hierarchy collection, and that storage failures surface as
//! errors.

use std::collections::HashMap;

use campus_sync::{
    error::Error,
    service::{lookup::LookupService, migration::MigrationService},
};
use campus_sync_test_utils::prelude::*;
use serde_json::json;

static SIGNUP_BASE_URL: &str = "https://app.example.com";

/// Tests re-running the institution migration.
///
/// Verifies that a second run leaves every institution field except `updatedAt` as
/// the first run wrote it, including the generated signup token.
///
/// Expected: identical documents apart from updatedAt
#[tokio::test]
async fn institution_migration_is_idempotent() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_institution_document("inst1", factory::legacy_institution("State University", Some("state.edu")))
        .with_institution_document(
            "inst2",
            json!({ "name": "City College", "isActive": false, "approvalStatus": "pending" }),
        )
        .build()
        .await?;
    let service = MigrationService::new(test.store(), &test.db, SIGNUP_BASE_URL);

    service.migrate_all_data().await.unwrap();
    let mut first = test.documents().fields("institutions/inst1").await?.unwrap();
    service.migrate_all_data().await.unwrap();
    let mut second = test.documents().fields("institutions/inst1").await?.unwrap();

    first.remove("updatedAt");
    second.remove("updatedAt");
    assert_eq!(first, second);

    let token = first["customSignupToken"].as_str().unwrap();
    assert_eq!(
        first["customSignupLink"],
        json!(format!("{SIGNUP_BASE_URL}/signup/{token}"))
    );
    assert_eq!(first["createdAt"], json!("2025-01-01T00:00:00Z"));

    let city = test.documents().fields("institutions/inst2").await?.unwrap();
    assert_eq!(city["isActive"], json!(false));
    assert_eq!(city["approvalStatus"], json!("pending"));

    Ok(())
}

/// Tests the role partition after migration.
///
/// Verifies that every migrated user appears in exactly one hierarchy collection with
/// its source role, and that skipped users appear in none.
///
/// Expected: one placement per migrated user, none for skipped users
#[tokio::test]
async fn partitions_users_by_role() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_institution_document("inst1", factory::legacy_institution("State University", None))
        .with_legacy_user("p1", factory::legacy_user("ops@platform.io", "platform_admin"))
        .with_legacy_user("a1", factory::affiliated_user("dean@state.edu", "institution_admin", "inst1", None))
        .with_legacy_user("t1", factory::affiliated_user("prof@state.edu", "teacher", "inst1", Some("Math")))
        .with_legacy_user("s1", factory::affiliated_user("s1@state.edu", "student", "inst1", Some("Math")))
        .with_legacy_user("s2", factory::affiliated_user("s2@state.edu", "student", "inst1", None))
        .with_legacy_user("e1", factory::legacy_user("solo@gmail.com", "student"))
        .with_legacy_user("x1", factory::legacy_user("orphan@state.edu", "institution_admin"))
        .with_legacy_user("x2", factory::affiliated_user("gone@old.edu", "student", "closed", None))
        .build()
        .await?;

    let report = MigrationService::new(test.store(), &test.db, SIGNUP_BASE_URL)
        .migrate_all_data()
        .await
        .unwrap();

    assert_eq!(report.platform_admins, 1);
    assert_eq!(report.institution_admins, 1);
    assert_eq!(report.teachers, 1);
    assert_eq!(report.students, 2);
    assert_eq!(report.external_users, 1);
    assert_eq!(report.departments_created, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);

    let users = LookupService::new(test.store()).list_all_users().await.unwrap();
    let mut placements: HashMap<String, Vec<String>> = HashMap::new();
    for user in &users {
        placements
            .entry(user.id.clone())
            .or_default()
            .push(user.role().to_string());
    }

    for (uid, role) in [
        ("p1", "platform_admin"),
        ("a1", "institution_admin"),
        ("t1", "teacher"),
        ("s1", "student"),
        ("s2", "student"),
        ("e1", "student"),
    ] {
        assert_eq!(placements.get(uid), Some(&vec![role.to_string()]), "user {uid}");
    }
    assert!(!placements.contains_key("x1"));
    assert!(!placements.contains_key("x2"));

    Ok(())
}

/// Tests error handling when the reconciliation log table is missing.
///
/// Verifies that a failed log write does not abort the batch: the skip is still counted
/// and the remaining users are migrated.
///
/// Expected: Ok with the skip counted
#[tokio::test]
async fn continues_when_log_write_fails() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_legacy_user("x1", factory::legacy_user("orphan@state.edu", "institution_admin"))
        .with_legacy_user("e1", factory::legacy_user("solo@gmail.com", "teacher"))
        .build()
        .await?;

    let report = MigrationService::new(test.store(), &test.db, SIGNUP_BASE_URL)
        .migrate_all_data()
        .await
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.external_users, 1);

    Ok(())
}

/// Tests statistics without relational tables.
///
/// Verifies that statistics only read the document store.
///
/// Expected: Ok
#[tokio::test]
async fn stats_need_no_relational_tables() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_legacy_user("u1", factory::legacy_user("a@x.edu", "teacher"))
        .build()
        .await?;

    let result: Result<_, Error> = MigrationService::new(test.store(), &test.db, SIGNUP_BASE_URL)
        .migration_stats()
        .await;

    assert_eq!(result.unwrap().users, 1);

    Ok(())
}
