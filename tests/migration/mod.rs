//! Tests for the flat-to-hierarchy migration.
//!
//! This module runs full migrations over seeded legacy collections and verifies the
//! resulting hierarchy through the lookup service.

mod lookup_after_migration;
mod migrate_all_data;
