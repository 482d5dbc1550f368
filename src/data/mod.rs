//! Data access layer repositories.
//!
//! Repositories provide an abstraction layer over storage, organized by store:
//! `document` for the hierarchical document store and the legacy flat collections,
//! `relational` for the PostgreSQL mirror.

pub mod document;
pub mod relational;
