//! Tests for CrossReferenceService::run.

use campus_sync::{error::Error, service::check::cross_reference::CrossReferenceService};
use campus_sync_test_utils::prelude::*;

/// Tests institution matching across differing IDs.
///
/// Verifies that institutions whose names differ only in case and spacing match in both
/// directions even though the document ID and the relational UUID are unrelated.
///
/// Expected: every institution matched, nothing reported as one-sided
#[tokio::test]
async fn matches_institutions_regardless_of_ids() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_institution_document("Xy7Gq", factory::legacy_institution("State University", None))
        .with_institution_document("Pp02a", factory::legacy_institution("CITY   college", None))
        .build()
        .await?;
    test.relational()
        .insert_institution("state university", None)
        .await?;
    test.relational()
        .insert_institution("City College", None)
        .await?;

    let report = CrossReferenceService::new(test.store(), &test.db)
        .run()
        .await
        .unwrap();

    assert_eq!(report.matched_institutions.len(), 2);
    assert!(report.institutions_only_in_documents.is_empty());
    assert!(report.institutions_only_in_relational.is_empty());
    assert!(report.is_consistent());

    Ok(())
}

/// Tests matching users after a migration-shaped hierarchy.
///
/// Verifies that hierarchy users and relational users match by email ignoring case, and
/// that agreeing institutions produce no mismatch.
///
/// Expected: one matched user, no SQL
#[tokio::test]
async fn matches_users_by_email() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_institution_document("inst1", factory::legacy_institution("State University", None))
        .with_document(
            "institutions/inst1/admins/a1",
            factory::affiliated_user("Dean@State.edu", "institution_admin", "inst1", None),
        )
        .build()
        .await?;
    let institution = test
        .relational()
        .insert_institution("State University", None)
        .await?;
    test.relational()
        .insert_user("dean@state.edu", "institution_admin", Some(institution.id))
        .await?;

    let report = CrossReferenceService::new(test.store(), &test.db)
        .run()
        .await
        .unwrap();

    assert_eq!(report.matched_users, 1);
    assert!(report.institution_mismatches.is_empty());
    assert!(report.sql.is_empty());

    Ok(())
}

/// Tests error handling when database tables are missing.
///
/// Verifies that the checker propagates the database error instead of reporting an
/// empty relational side.
///
/// Expected: Err with DbErr
#[tokio::test]
async fn fails_when_tables_missing() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;

    let result = CrossReferenceService::new(test.store(), &test.db).run().await;

    assert!(matches!(result, Err(Error::DbErr(_))));

    Ok(())
}

/// Tests matching an institution whose document carries an unrecognised approval status.
///
/// Verifies that the document still takes part in name matching, and that the proposed
/// insert for an unmatched one falls back to `pending` rather than copying the value.
///
/// Expected: first institution matched; insert for the second uses 'pending'
#[tokio::test]
async fn matches_institution_with_unrecognised_status() -> Result<(), TestError> {
    let mut matched = factory::legacy_institution("State University", None);
    matched["approvalStatus"] = serde_json::json!("active");
    let mut unmatched = factory::legacy_institution("City College", None);
    unmatched["approvalStatus"] = serde_json::json!("on_hold");
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_institution_document("inst1", matched)
        .with_institution_document("inst2", unmatched)
        .build()
        .await?;
    test.relational()
        .insert_institution("State University", None)
        .await?;

    let report = CrossReferenceService::new(test.store(), &test.db)
        .run()
        .await
        .unwrap();

    assert_eq!(report.matched_institutions.len(), 1);
    assert_eq!(report.matched_institutions[0].document_id, "inst1");
    assert!(report.institutions_only_in_relational.is_empty());
    assert_eq!(report.institutions_only_in_documents.len(), 1);
    assert!(report.sql[0].contains("'City College'"));
    assert!(report.sql[0].contains("'pending'"));
    assert!(!report.sql[0].contains("on_hold"));

    Ok(())
}
