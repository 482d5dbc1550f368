//! Services over the document store and the relational mirror.
//!
//! Services borrow their dependencies and are created per command:
//! - `migration` - flat collections into the hierarchy
//! - `lookup` - locating users in the hierarchy
//! - `check` - cross-store consistency checks
//! - `replay` - re-running reconciliation log entries

pub mod check;
pub mod lookup;
pub mod migration;
pub mod replay;
