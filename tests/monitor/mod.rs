//! Tests for the continuous sync monitor.

use std::time::Duration;

use campus_sync::scheduler::{MonitorState, SyncMonitor};
use campus_sync_test_utils::prelude::*;

/// Tests starting and stopping the monitor.
///
/// Verifies that the first cycle runs before `start` returns, that its findings are kept
/// as the last summary, and that the monitor shuts down cleanly.
///
/// Expected: summary with one orphaned request and one missing user
#[tokio::test(flavor = "multi_thread")]
async fn runs_first_cycle_on_start() -> Result<(), TestError> {
    let test = TestBuilder::new()
        .with_relational_tables()
        .with_interest("i1", factory::interest("State University", "dean@state.edu", "pending"))
        .build()
        .await?;
    let mut monitor = SyncMonitor::new(test.shared_store(), test.db.clone(), Duration::from_secs(3600))
        .await
        .unwrap();

    monitor.start().await.unwrap();

    let summary = monitor.last_summary().await.unwrap();
    assert_eq!(summary.orphaned_requests, 1);
    assert_eq!(summary.missing_users, 1);
    assert_eq!(summary.institution_alerts, 0);
    assert_eq!(monitor.state(), MonitorState::Idle);

    monitor.shutdown().await.unwrap();

    Ok(())
}

/// Tests a cycle against a database without tables.
///
/// Verifies that a failing cycle is logged and does not stop `start`.
///
/// Expected: Ok from start, no summary
#[tokio::test(flavor = "multi_thread")]
async fn survives_failing_cycle() -> Result<(), TestError> {
    let test = TestBuilder::new().build().await?;
    let mut monitor = SyncMonitor::new(test.shared_store(), test.db.clone(), Duration::from_secs(3600))
        .await
        .unwrap();

    monitor.start().await.unwrap();

    assert!(monitor.last_summary().await.is_none());

    monitor.shutdown().await.unwrap();

    Ok(())
}
