//! Document store abstraction.
//!
//! The platform keeps its authoritative runtime data in a Firestore database laid out as
//! nested collections. This crate exposes that layout through the [`DocumentStore`] trait
//! with two implementations: [`MemoryDocumentStore`], used by tests and dry runs, and
//! [`FirestoreStore`], which talks to the Firestore REST API (or its emulator).

pub mod document;
pub mod error;
pub mod firestore;
pub mod id;
pub mod memory;
pub mod path;

use async_trait::async_trait;

pub use document::{to_fields, Document, Fields};
pub use error::StoreError;
pub use firestore::{auth::ServiceAccountKey, auth::TokenSource, FirestoreStore};
pub use memory::MemoryDocumentStore;
pub use path::{CollectionPath, DocPath};

/// How [`DocumentStore::set`] treats fields already present on the target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document with the given fields.
    Overwrite,
    /// Replace only the top-level fields present in the write, keeping all others.
    Merge,
}

/// Operations the reconciliation services need from a document database.
///
/// Every method takes fully qualified paths, so nested collections
/// (`institutions/{id}/departments/{id}/students`) are addressed exactly like top-level ones.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Point read of a single document. `Ok(None)` when the document does not exist.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// Creates or updates the document at `path`. A merge with no fields writes nothing.
    async fn set(&self, path: &DocPath, fields: Fields, mode: WriteMode) -> Result<(), StoreError>;

    /// Creates a document with a generated ID and returns its path.
    async fn add(&self, collection: &CollectionPath, fields: Fields)
        -> Result<DocPath, StoreError>;

    /// Returns every document of a collection, ordered by document ID.
    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError>;

    /// Deletes a document. Deleting a missing document is not an error.
    async fn delete(&self, path: &DocPath) -> Result<(), StoreError>;
}
