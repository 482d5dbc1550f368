use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    document::{Document, Fields},
    error::StoreError,
    id::auto_id,
    path::{CollectionPath, DocPath},
    DocumentStore, WriteMode,
};

/// In-process [`DocumentStore`] keyed by collection path.
///
/// Collections are kept in ID order, which matches the ordering Firestore uses when listing
/// a collection without an explicit `orderBy`. Point reads are counted so callers can
/// observe how many probes an operation needed.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<CollectionPath, BTreeMap<String, Fields>>>,
    reads: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of point reads (`get`) served since creation.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of documents currently stored directly in `collection`.
    pub async fn len(&self, collection: &CollectionPath) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        path.validate()?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        let collections = self.collections.read().await;
        let fields = collections
            .get(path.parent())
            .and_then(|docs| docs.get(path.id()))
            .cloned();

        Ok(fields.map(|fields| Document::new(path.clone(), fields)))
    }

    async fn set(&self, path: &DocPath, fields: Fields, mode: WriteMode) -> Result<(), StoreError> {
        path.validate()?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(path.parent().clone()).or_default();

        match mode {
            WriteMode::Overwrite => {
                docs.insert(path.id().to_string(), fields);
            }
            WriteMode::Merge if fields.is_empty() => {}
            WriteMode::Merge => {
                let existing = docs.entry(path.id().to_string()).or_default();
                existing.extend(fields);
            }
        }

        Ok(())
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<DocPath, StoreError> {
        collection.validate()?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.clone()).or_default();

        let mut id = auto_id();
        while docs.contains_key(&id) {
            id = auto_id();
        }
        docs.insert(id.clone(), fields);

        Ok(collection.doc(id))
    }

    async fn list(&self, collection: &CollectionPath) -> Result<Vec<Document>, StoreError> {
        collection.validate()?;

        let collections = self.collections.read().await;
        let documents = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(collection.doc(id.clone()), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(documents)
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        path.validate()?;

        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(path.parent()) {
            docs.remove(path.id());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn get_returns_none_for_missing_document() {
        let store = MemoryDocumentStore::new();

        let result = store.get(&CollectionPath::root("users").doc("u1")).await;

        assert!(matches!(result, Ok(None)));
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn merge_keeps_fields_absent_from_write() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::root("institutions").doc("inst1");
        store
            .set(&path, fields(json!({ "name": "Uni", "isActive": false })), WriteMode::Overwrite)
            .await
            .unwrap();

        store
            .set(&path, fields(json!({ "isActive": true })), WriteMode::Merge)
            .await
            .unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], json!("Uni"));
        assert_eq!(doc.fields["isActive"], json!(true));
    }

    #[tokio::test]
    async fn overwrite_replaces_document() {
        let store = MemoryDocumentStore::new();
        let path = CollectionPath::root("institutions").doc("inst1");
        store
            .set(&path, fields(json!({ "name": "Uni", "domain": "uni.edu" })), WriteMode::Overwrite)
            .await
            .unwrap();

        store
            .set(&path, fields(json!({ "name": "Uni" })), WriteMode::Overwrite)
            .await
            .unwrap();

        let doc = store.get(&path).await.unwrap().unwrap();
        assert!(doc.fields.get("domain").is_none());
    }

    #[tokio::test]
    async fn add_generates_unique_ids_and_list_is_ordered() {
        let store = MemoryDocumentStore::new();
        let departments = CollectionPath::root("institutions")
            .doc("inst1")
            .collection("departments");

        let first = store.add(&departments, fields(json!({ "n": 1 }))).await.unwrap();
        let second = store.add(&departments, fields(json!({ "n": 2 }))).await.unwrap();

        assert_ne!(first, second);
        let listed = store.list(&departments).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].id() < listed[1].id());
    }

    #[tokio::test]
    async fn subcollections_are_independent_of_parent_listing() {
        let store = MemoryDocumentStore::new();
        let institutions = CollectionPath::root("institutions");
        let inst = institutions.doc("inst1");
        store
            .set(&inst, fields(json!({ "name": "Uni" })), WriteMode::Overwrite)
            .await
            .unwrap();
        store
            .set(
                &inst.collection("admins").doc("u1"),
                fields(json!({ "email": "a@uni.edu" })),
                WriteMode::Overwrite,
            )
            .await
            .unwrap();

        assert_eq!(store.list(&institutions).await.unwrap().len(), 1);
        assert_eq!(store.len(&inst.collection("admins")).await, 1);
    }

    #[tokio::test]
    async fn delete_missing_document_is_ok() {
        let store = MemoryDocumentStore::new();

        let result = store.delete(&CollectionPath::root("users").doc("nope")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn invalid_paths_are_rejected() {
        let store = MemoryDocumentStore::new();

        let result = store
            .set(&CollectionPath::root("users").doc(""), Fields::new(), WriteMode::Merge)
            .await;

        assert!(matches!(result, Err(StoreError::InvalidPath { .. })));
    }
}
