//! Database model type aliases.
//!
//! Short names for the SeaORM models of the relational mirror, so services do not need to
//! spell out the `entity` crate paths.

/// Type alias for a relational institution row.
///
/// # Fields (from `entity::institution::Model`)
/// - `id` - UUID primary key, unrelated to the institution's document ID
/// - `name` - Natural key used to match the institution across stores
/// - `domain` - Optional email domain used by the domain heuristic
/// - `contact_email` - Optional contact address
/// - `approval_status` - `pending`, `approved` or `rejected`
/// - `is_active` - Whether the institution may use the platform
pub type InstitutionModel = entity::institution::Model;

/// Type alias for a relational user row.
///
/// # Fields (from `entity::user::Model`)
/// - `id` - UUID primary key
/// - `firebase_uid` - Document ID of the user in the hierarchy, when linked
/// - `email` - Natural key used to match the user across stores
/// - `role` - Role string as stored by the web application
/// - `institution_id` - Institution reference, not guaranteed to exist
pub type UserModel = entity::user::Model;

/// Type alias for a relational session pool row.
pub type SessionPoolModel = entity::session_pool::Model;

/// Type alias for a reconciliation log entry.
pub type ReconciliationLogModel = entity::reconciliation_log::Model;
