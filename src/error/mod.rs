//! Error types for campus-sync.
//!
//! Domain-specific errors are aggregated into [`Error`] with `thiserror`'s `#[from]`
//! conversions so the `?` operator works across repositories, services and the CLI.

pub mod config;

use thiserror::Error;

use crate::error::config::ConfigError;

/// Main error type for campus-sync.
///
/// # Error Categories
/// - Configuration errors (missing/invalid environment variables)
/// - Document store errors (transport, HTTP status, decoding, credentials)
/// - Relational database errors
/// - Records that cannot be interpreted (unknown role, malformed fields)
/// - External library errors (scheduler, JSON)
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing or invalid environment variables).
    #[error(transparent)]
    ConfigError(#[from] ConfigError),
    /// Document store error (Firestore REST API, emulator, credentials).
    #[error(transparent)]
    StoreError(#[from] docstore::StoreError),
    /// A stored record could not be interpreted.
    #[error("Invalid record {subject}: {reason}")]
    InvalidRecord { subject: String, reason: String },
    /// Internal error indicating a bug in campus-sync's code.
    #[error("Internal error, this indicates a bug: {0:?}")]
    InternalError(String),
    /// Database error (query failures, connection issues, constraint violations).
    #[error(transparent)]
    DbErr(#[from] sea_orm::DbErr),
    /// Cron scheduler error (job registration, scheduler startup).
    #[error(transparent)]
    SchedulerError(#[from] tokio_cron_scheduler::JobSchedulerError),
    /// JSON (de)serialization error.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_record(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            subject: subject.into(),
            reason: reason.into(),
        }
    }
}
