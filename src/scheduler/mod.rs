//! Continuous consistency monitoring.
//!
//! The [`SyncMonitor`] runs the orphaned-request, institution-ID and missing-user checks
//! once at startup and then on a fixed interval through `tokio-cron-scheduler`. A cycle
//! that fails is logged and the timer keeps running; a tick that fires while the previous
//! cycle is still running is skipped.

pub mod config;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use docstore::DocumentStore;
use sea_orm::DatabaseConnection;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{
    error::Error,
    service::check::{
        contact_form::{classify_all, ConnectionStatus},
        validation::{institution_alerts, missing_user_alerts},
        Snapshot,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Syncing,
}

/// Outcome of one monitoring cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// Contact-form submissions with no matching hierarchy user.
    pub orphaned_requests: usize,
    pub institution_alerts: usize,
    pub missing_users: usize,
}

impl SyncSummary {
    pub fn is_clean(&self) -> bool {
        self.orphaned_requests == 0 && self.institution_alerts == 0 && self.missing_users == 0
    }
}

/// Everything a cycle needs, cloned into the scheduled job.
#[derive(Clone)]
struct SyncTask {
    store: Arc<dyn DocumentStore>,
    db: DatabaseConnection,
    syncing: Arc<AtomicBool>,
    last_summary: Arc<RwLock<Option<SyncSummary>>>,
}

/// Clears the syncing flag when the cycle ends, including by panic.
struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SyncTask {
    fn try_begin(&self) -> Option<SyncGuard<'_>> {
        self.syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard(&self.syncing))
    }

    async fn perform_sync(&self) -> Option<SyncSummary> {
        let Some(_guard) = self.try_begin() else {
            tracing::warn!("Previous sync still running, skipping this cycle");
            return None;
        };

        tracing::info!("Starting sync cycle");

        match run_checks(self.store.as_ref(), &self.db).await {
            Ok(summary) => {
                tracing::info!(
                    "Sync cycle finished in {:?}: {} orphaned request(s), {} institution alert(s), {} missing user(s)",
                    summary.duration,
                    summary.orphaned_requests,
                    summary.institution_alerts,
                    summary.missing_users
                );
                *self.last_summary.write().await = Some(summary.clone());
                Some(summary)
            }
            Err(e) => {
                tracing::error!("Sync cycle failed: {}", e);
                None
            }
        }
    }
}

async fn run_checks(store: &dyn DocumentStore, db: &DatabaseConnection) -> Result<SyncSummary, Error> {
    let started_at = Utc::now();
    let timer = Instant::now();
    let snapshot = Snapshot::load(store, db).await?;

    let mut orphaned_requests = 0;
    for connection in classify_all(&snapshot) {
        if matches!(connection.status, ConnectionStatus::MissingUser) {
            tracing::warn!(
                "Orphaned request {}: no user for {} ({})",
                connection.interest.id,
                connection.interest.doc.email,
                connection.interest.doc.institution_name
            );
            orphaned_requests += 1;
        }
    }

    let institution_alerts = institution_alerts(&snapshot);
    for alert in &institution_alerts {
        tracing::warn!("{}", alert);
    }

    let missing_users = missing_user_alerts(&snapshot);
    for alert in &missing_users {
        tracing::warn!("{}", alert);
    }

    Ok(SyncSummary {
        started_at,
        duration: timer.elapsed(),
        orphaned_requests,
        institution_alerts: institution_alerts.len(),
        missing_users: missing_users.len(),
    })
}

/// Runs the consistency checks on a fixed interval.
pub struct SyncMonitor {
    task: SyncTask,
    interval: Duration,
    sched: JobScheduler,
}

impl SyncMonitor {
    /// Creates a new instance of [`SyncMonitor`]
    ///
    /// # Arguments
    /// - `store` - Document store shared with the scheduled job
    /// - `db` - Relational database connection
    /// - `interval` - Time between the end of startup and each following cycle
    ///
    /// # Returns
    /// - `Ok(SyncMonitor)` - Monitor in the idle state, not yet started
    /// - `Err(Error)` - Failed to initialize the underlying job scheduler
    pub async fn new(
        store: Arc<dyn DocumentStore>,
        db: DatabaseConnection,
        interval: Duration,
    ) -> Result<Self, Error> {
        let sched = JobScheduler::new().await?;

        Ok(Self {
            task: SyncTask {
                store,
                db,
                syncing: Arc::new(AtomicBool::new(false)),
                last_summary: Arc::new(RwLock::new(None)),
            },
            interval,
            sched,
        })
    }

    /// Runs one cycle immediately, then registers the repeating job and starts the scheduler
    ///
    /// # Returns
    /// - `Ok(())` - The job is registered and the scheduler running
    /// - `Err(Error)` - Failed to register the job or start the scheduler
    pub async fn start(&mut self) -> Result<(), Error> {
        self.task.perform_sync().await;

        let task = self.task.clone();
        self.sched
            .add(Job::new_repeated_async(self.interval, move |_, _| {
                let task = task.clone();

                Box::pin(async move {
                    task.perform_sync().await;
                })
            })?)
            .await?;

        self.sched.start().await?;

        tracing::info!("Sync monitor running every {:?}", self.interval);

        Ok(())
    }

    /// Runs one cycle now
    ///
    /// # Returns
    /// - `Some(SyncSummary)` - The cycle completed
    /// - `None` - Another cycle was running, or the cycle failed and was logged
    pub async fn perform_sync(&self) -> Option<SyncSummary> {
        self.task.perform_sync().await
    }

    pub fn state(&self) -> MonitorState {
        if self.task.syncing.load(Ordering::Acquire) {
            MonitorState::Syncing
        } else {
            MonitorState::Idle
        }
    }

    /// Summary of the most recent successful cycle
    pub async fn last_summary(&self) -> Option<SyncSummary> {
        self.task.last_summary.read().await.clone()
    }

    /// Stops the scheduler; a cycle already running finishes on its own
    pub async fn shutdown(&mut self) -> Result<(), Error> {
        self.sched.shutdown().await?;
        tracing::info!("Sync monitor stopped");

        Ok(())
    }
}
