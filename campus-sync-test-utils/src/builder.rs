//! Declarative test builder.
//!
//! This module provides the `TestBuilder` API for configuring test environments before execution.
//! The builder pattern allows chaining multiple configuration methods together, with all operations
//! queued and executed during the final `build()` call.

use sea_orm::{sea_query::TableCreateStatement, EntityTrait, Schema};
use serde_json::Value;

use crate::{error::TestError, TestContext};

/// Builder for declarative test initialization.
///
/// Provides an interface for setting up test environments with database tables and
/// document fixtures. Methods can be chained together and finalized with `build()`.
pub struct TestBuilder {
    // Tables to create
    tables: Vec<TableCreateStatement>,
    include_relational_tables: bool,

    // Documents to write, (path, fields)
    documents: Vec<(String, Value)>,
}

impl TestBuilder {
    /// Create a new TestBuilder.
    ///
    /// Initializes an empty builder with no tables or documents configured.
    ///
    /// # Returns
    /// - `TestBuilder` - A new builder instance ready for configuration
    pub fn new() -> Self {
        Self {
            tables: Vec::new(),
            include_relational_tables: false,
            documents: Vec::new(),
        }
    }

    /// Add every table of the relational mirror to the test database.
    ///
    /// Creates Institution, User, SessionPool and ReconciliationLog.
    ///
    /// # Returns
    /// - `Self` - The builder instance for method chaining
    pub fn with_relational_tables(mut self) -> Self {
        self.include_relational_tables = true;
        self
    }

    /// Add a custom entity table to the test database.
    ///
    /// Generates a CREATE TABLE statement for the entity, which will be executed during `build()`.
    /// Chain multiple calls to add multiple tables.
    ///
    /// # Arguments
    /// - `entity` - Entity type implementing `EntityTrait`
    ///
    /// # Returns
    /// - `Self` - The builder instance for method chaining
    ///
    /// # Example
    ///
    /// ```no_run
    /// use campus_sync_test_utils::TestBuilder;
    /// use entity::prelude::*;
    ///
    /// # async fn example() -> Result<(), campus_sync_test_utils::TestError> {
    /// let test = TestBuilder::new()
    ///     .with_table(Institution)
    ///     .with_table(User)
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_table<E: EntityTrait>(mut self, entity: E) -> Self {
        let schema = Schema::new(sea_orm::DbBackend::Sqlite);
        self.tables.push(schema.create_table_from_entity(entity));
        self
    }

    /// Write a document at a `/`-separated path during `build()`.
    ///
    /// # Arguments
    /// - `path` - Document path such as `institutions/inst1`
    /// - `fields` - JSON object with the document fields
    pub fn with_document(mut self, path: impl Into<String>, fields: Value) -> Self {
        self.documents.push((path.into(), fields));
        self
    }

    /// Queue a legacy flat `users/{id}` document.
    pub fn with_legacy_user(self, id: &str, fields: Value) -> Self {
        self.with_document(format!("users/{id}"), fields)
    }

    /// Queue an `institutions/{id}` document.
    pub fn with_institution_document(self, id: &str, fields: Value) -> Self {
        self.with_document(format!("institutions/{id}"), fields)
    }

    /// Queue an `institution_interests/{id}` document.
    pub fn with_interest(self, id: &str, fields: Value) -> Self {
        self.with_document(format!("institution_interests/{id}"), fields)
    }

    /// Build the test setup by creating all configured tables and documents.
    ///
    /// Executes all queued operations in the following order:
    /// 1. Creates database tables (relational mirror tables if specified, then custom tables)
    /// 2. Writes document fixtures in the order they were queued
    ///
    /// # Returns
    /// - `Ok(TestContext)` - Fully configured test environment ready for use
    /// - `Err(TestError::DbErr)` - Database table creation failed
    /// - `Err(TestError::StoreError)` - A document path was invalid
    pub async fn build(self) -> Result<TestContext, TestError> {
        let setup = TestContext::new().await?;

        // 1. Create tables
        let mut all_tables = Vec::new();

        if self.include_relational_tables {
            let schema = Schema::new(sea_orm::DbBackend::Sqlite);
            all_tables.extend(vec![
                schema.create_table_from_entity(entity::prelude::Institution),
                schema.create_table_from_entity(entity::prelude::User),
                schema.create_table_from_entity(entity::prelude::SessionPool),
                schema.create_table_from_entity(entity::prelude::ReconciliationLog),
            ]);
        }

        all_tables.extend(self.tables);
        setup.with_tables(all_tables).await?;

        // 2. Write documents
        for (path, fields) in self.documents {
            setup.documents().insert(&path, fields).await?;
        }

        Ok(setup)
    }
}

impl Default for TestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
