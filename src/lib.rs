//! Hierarchy migration and cross-store reconciliation for the interview practice platform.
//!
//! The platform keeps its runtime data in a Firestore database and mirrors part of it in
//! PostgreSQL. This crate migrates the legacy flat `users` and `institutions` collections
//! into the institution / department hierarchy, locates users in that hierarchy, and checks
//! both stores against each other, once from the command line or continuously through the
//! [`scheduler::SyncMonitor`].
//!
//! The document store is authoritative. Fixes to the relational mirror are emitted as SQL
//! for an operator to review and are never applied by this crate.

pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod service;
pub mod startup;
pub mod util;

pub use error::Error;
