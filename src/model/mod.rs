//! Domain models shared by repositories and services.
//!
//! Document models mirror the camelCase layout of the document store; relational models are
//! re-exported from the `entity` crate through [`db`].

pub mod db;
pub mod department;
pub mod institution;
pub mod interest;
pub mod placement;
pub mod reconciliation;
pub mod role;
pub mod user;
