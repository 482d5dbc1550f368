pub use super::institution::Entity as Institution;
pub use super::reconciliation_log::Entity as ReconciliationLog;
pub use super::session_pool::Entity as SessionPool;
pub use super::user::Entity as User;
