//! Tests for LookupService::find_user_by_id over a migrated hierarchy.
//!
//! This module verifies that every migrated user is found with its source role, and walks
//! a student through department creation end to end.

use campus_sync::{
    model::{placement::Placement, role::Role},
    service::{lookup::LookupService, migration::MigrationService},
};
use campus_sync_test_utils::prelude::*;
use serde_json::json;

static SIGNUP_BASE_URL: &str = "http://localhost:5173";

/// Tests lookup completeness after migration.
///
/// Verifies that each migrated user is found by ID with the role it had in the flat
/// collection.
///
/// Expected: Some(user) with the source role for every migrated user
#[tokio::test]
async fn finds_every_migrated_user_with_source_role() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_institution_document("inst1", factory::legacy_institution("State University", None))
        .with_institution_document("inst2", factory::legacy_institution("City College", None))
        .with_legacy_user("p1", factory::legacy_user("ops@platform.io", "platform_admin"))
        .with_legacy_user("a2", factory::affiliated_user("dean@city.edu", "institution_admin", "inst2", None))
        .with_legacy_user("t1", factory::affiliated_user("prof@state.edu", "Teacher", "inst1", Some("Physics")))
        .with_legacy_user("s2", factory::affiliated_user("kid@city.edu", "student", "inst2", Some("Arts")))
        .with_legacy_user("e1", factory::legacy_user("tutor@gmail.com", "teacher"))
        .build()
        .await?;

    MigrationService::new(test.store(), &test.db, SIGNUP_BASE_URL)
        .migrate_all_data()
        .await
        .unwrap();

    let lookup = LookupService::new(test.store());
    for (uid, role, institution) in [
        ("p1", Role::PlatformAdmin, None),
        ("a2", Role::InstitutionAdmin, Some("inst2")),
        ("t1", Role::Teacher, Some("inst1")),
        ("s2", Role::Student, Some("inst2")),
        ("e1", Role::Teacher, None),
    ] {
        let found = lookup.find_user_by_id(uid).await.unwrap();
        let found = found.unwrap_or_else(|| panic!("user {uid} not found"));
        assert_eq!(found.role(), role, "user {uid}");
        assert_eq!(found.institution_id(), institution, "user {uid}");
    }

    assert!(lookup.find_user_by_id("missing").await.unwrap().is_none());

    Ok(())
}

/// Tests the single-student scenario.
///
/// Verifies that migrating student `u1` of `inst1` with the absent department "CS"
/// creates the department, writes the student below it, and that lookup returns the
/// student with both IDs.
///
/// Expected: department "CS" with studentCount 1 and the student found in it
#[tokio::test]
async fn creates_department_for_student() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_institution_document("inst1", factory::legacy_institution("State University", None))
        .with_legacy_user("u1", factory::affiliated_user("s@state.edu", "student", "inst1", Some("CS")))
        .build()
        .await?;

    let report = MigrationService::new(test.store(), &test.db, SIGNUP_BASE_URL)
        .migrate_all_data()
        .await
        .unwrap();
    assert_eq!(report.students, 1);
    assert_eq!(report.departments_created, 1);

    let found = LookupService::new(test.store())
        .find_user_by_id("u1")
        .await
        .unwrap()
        .unwrap();

    let Placement::Student {
        institution_id,
        department_id,
    } = &found.placement
    else {
        panic!("expected a student placement, got {:?}", found.placement);
    };
    assert_eq!(institution_id, "inst1");

    let department = test
        .documents()
        .fields(&format!("institutions/inst1/departments/{department_id}"))
        .await?
        .unwrap();
    assert_eq!(department["departmentName"], json!("CS"));
    assert_eq!(department["studentCount"], json!(1));

    let student = test
        .documents()
        .fields(&format!(
            "institutions/inst1/departments/{department_id}/students/u1"
        ))
        .await?
        .unwrap();
    assert_eq!(student["departmentId"], json!(department_id));
    assert_eq!(student["institutionId"], json!("inst1"));
    assert_eq!(student["sessionCount"], json!(2));

    Ok(())
}
