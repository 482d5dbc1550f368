//! SeaORM entities for the relational mirror of the platform's data.

pub mod prelude;

pub mod institution;
pub mod reconciliation_log;
pub mod session_pool;
pub mod user;
