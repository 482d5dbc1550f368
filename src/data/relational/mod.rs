//! SeaORM repositories over the PostgreSQL mirror.

pub mod institution;
pub mod reconciliation_log;
pub mod session_pool;
pub mod user;
