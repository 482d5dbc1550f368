//! Test context structure and utilities.
//!
//! This module provides the `TestContext` returned by `TestBuilder`. The context holds an
//! in-memory SQLite database standing in for PostgreSQL and an in-memory document store
//! standing in for Firestore.

use std::sync::Arc;

use docstore::{DocumentStore, MemoryDocumentStore};
use sea_orm::{sea_query::TableCreateStatement, ConnectionTrait, Database, DatabaseConnection};

use crate::error::TestError;

/// Test context structure returned by `TestBuilder`
///
/// # Usage
///
/// ```ignore
/// let test = TestBuilder::new().with_relational_tables().build().await?;
///
/// let institution = test.relational().insert_institution("State University", None).await?;
/// test.documents().insert_legacy_user("u1", factory::legacy_user("a@uni.edu", "student")).await?;
///
/// let service = MigrationService::new(test.store(), &test.db, "http://localhost:5173");
/// ```
pub struct TestContext {
    /// Database connection to in-memory SQLite database
    pub db: DatabaseConnection,
    /// In-memory document store shared with the services under test
    pub store: Arc<MemoryDocumentStore>,
}

impl TestContext {
    /// Create a new test context with an empty database and an empty document store.
    ///
    /// # Returns
    /// - `Ok(TestContext)` - Fully initialized test context
    /// - `Err(TestError::DbErr)` - Database connection failed
    pub(crate) async fn new() -> Result<Self, TestError> {
        let db = Database::connect("sqlite::memory:").await?;

        Ok(TestContext {
            db,
            store: Arc::new(MemoryDocumentStore::new()),
        })
    }

    /// The document store as a trait object, the way services receive it.
    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// A shared handle to the document store for components that own their dependencies.
    pub fn shared_store(&self) -> Arc<dyn DocumentStore> {
        self.store.clone()
    }

    /// Create database tables from schema statements.
    ///
    /// # Arguments
    /// - `stmts` - Vector of CREATE TABLE statements to execute
    ///
    /// # Returns
    /// - `Ok(())` - All tables created successfully
    /// - `Err(TestError::DbErr)` - Table creation failed
    pub(crate) async fn with_tables(
        &self,
        stmts: Vec<TableCreateStatement>,
    ) -> Result<(), TestError> {
        for stmt in stmts {
            self.db.execute(&stmt).await?;
        }

        Ok(())
    }
}
