//! Tests for ValidationService::run.

use campus_sync::service::check::validation::{AlertKind, Severity, ValidationService};
use campus_sync_test_utils::prelude::*;

/// Tests orphan detection for contact-form submissions.
///
/// Verifies that every submission not yet completed whose email has no relational user
/// raises a critical `missing_user` alert, whatever its other status.
///
/// Expected: alerts for the pending, contacted and processed submissions only
#[tokio::test]
async fn flags_every_open_submission_without_user() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_interest("i1", factory::interest("State University", "a@state.edu", "pending"))
        .with_interest("i2", factory::interest("State University", "b@state.edu", "contacted"))
        .with_interest("i3", factory::interest("State University", "c@state.edu", "processed"))
        .with_interest("i4", factory::interest("State University", "d@state.edu", "completed"))
        .with_interest("i5", factory::interest("State University", "E@State.edu", "pending"))
        .build()
        .await?;
    test.relational()
        .insert_user("e@state.edu", "institution_admin", None)
        .await?;

    let report = ValidationService::new(test.store(), &test.db)
        .run()
        .await
        .unwrap();

    let alerts: Vec<_> = report.of_kind(AlertKind::MissingUser).collect();
    let subjects: Vec<&str> = alerts.iter().map(|alert| alert.subject.as_str()).collect();
    assert_eq!(subjects, vec!["i1", "i2", "i3"]);
    assert!(alerts
        .iter()
        .all(|alert| alert.severity() == Severity::Critical));

    Ok(())
}

/// Tests a consistent pair of stores.
///
/// Verifies that an approved institution with an admin and a session pool raises no
/// alert.
///
/// Expected: empty report
#[tokio::test]
async fn reports_nothing_for_consistent_stores() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_institution_document("inst1", factory::legacy_institution("State University", None))
        .with_document(
            "institutions/inst1/admins/a1",
            factory::affiliated_user("dean@state.edu", "institution_admin", "inst1", None),
        )
        .with_interest("i1", factory::interest("State University", "dean@state.edu", "completed"))
        .build()
        .await?;
    let institution = test
        .relational()
        .insert_institution("State University", Some("state.edu"))
        .await?;
    test.relational()
        .insert_user("dean@state.edu", "institution_admin", Some(institution.id))
        .await?;
    test.relational()
        .insert_session_pool(institution.id, 100)
        .await?;

    let report = ValidationService::new(test.store(), &test.db)
        .run()
        .await
        .unwrap();

    assert!(report.alerts.is_empty(), "unexpected alerts: {report}");

    Ok(())
}

/// Tests orphan detection for a submission with an unrecognised status.
///
/// Verifies that a status outside the known lifecycle, such as one written by an older
/// form, still counts as not completed.
///
/// Expected: one critical `missing_user` alert for the submission
#[tokio::test]
async fn flags_submission_with_unrecognised_status() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_interest("i1", factory::interest("State University", "dean@state.edu", "new"))
        .build()
        .await?;

    let report = ValidationService::new(test.store(), &test.db)
        .run()
        .await
        .unwrap();

    let alerts: Vec<_> = report.of_kind(AlertKind::MissingUser).collect();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].subject, "i1");
    assert_eq!(alerts[0].severity(), Severity::Critical);

    Ok(())
}

/// Tests members of an institution whose document carries unexpected field values.
///
/// Verifies that an unrecognised `approvalStatus` and a non-boolean `isActive` do not hide
/// the institution, so its members are not reported as naming a missing institution.
///
/// Expected: no `document_institution_mismatch` alert
#[tokio::test]
async fn tolerates_unexpected_institution_fields() -> Result<(), TestError> {
    let mut institution = factory::legacy_institution("State University", None);
    institution["approvalStatus"] = serde_json::json!("active");
    institution["isActive"] = serde_json::json!(1);
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_institution_document("inst1", institution)
        .with_document(
            "institutions/inst1/admins/a1",
            factory::affiliated_user("dean@state.edu", "institution_admin", "inst1", None),
        )
        .build()
        .await?;

    let report = ValidationService::new(test.store(), &test.db)
        .run()
        .await
        .unwrap();

    assert_eq!(report.of_kind(AlertKind::DocumentInstitutionMismatch).count(), 0);

    Ok(())
}
