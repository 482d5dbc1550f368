use docstore::{CollectionPath, Document, DocumentStore, StoreError};

use crate::data::document::LEGACY_USERS;

/// The flat `users` collection the hierarchy is migrated from. Read-only.
pub struct LegacyUserRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> LegacyUserRepository<'a> {
    /// Creates a new instance of [`LegacyUserRepository`]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Raw user documents, in ID order. Decoding is left to the caller so a malformed
    /// document can be reported against its ID.
    pub async fn list(&self) -> Result<Vec<Document>, StoreError> {
        self.store.list(&CollectionPath::root(LEGACY_USERS)).await
    }

    pub async fn get(&self, uid: &str) -> Result<Option<Document>, StoreError> {
        self.store
            .get(&CollectionPath::root(LEGACY_USERS).doc(uid))
            .await
    }
}
