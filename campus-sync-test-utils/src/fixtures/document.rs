//! Document store insertion utilities.

use docstore::{CollectionPath, DocPath, DocumentStore, Fields, WriteMode};
use serde_json::Value;

use crate::{error::TestError, TestContext};

pub struct DocumentFixtures<'a> {
    pub setup: &'a TestContext,
}

impl<'a> DocumentFixtures<'a> {
    /// Write `fields` to the document at a `/`-separated path, replacing any existing
    /// document.
    ///
    /// # Arguments
    /// - `path` - Document path such as `institutions/inst1/departments/d1`
    /// - `fields` - A JSON object; any other JSON value is written as an empty document
    ///
    /// # Returns
    /// - `Ok(DocPath)` - The parsed path that was written
    /// - `Err(TestError::StoreError)` - The path is invalid
    pub async fn insert(&self, path: &str, fields: Value) -> Result<DocPath, TestError> {
        let path = DocPath::parse(path)?;
        self.setup
            .store
            .set(&path, into_fields(fields), WriteMode::Overwrite)
            .await?;

        Ok(path)
    }

    /// Insert a document into the legacy flat `users` collection.
    pub async fn insert_legacy_user(&self, id: &str, fields: Value) -> Result<DocPath, TestError> {
        self.insert(&format!("users/{id}"), fields).await
    }

    /// Insert a document into the `institutions` collection.
    pub async fn insert_institution(&self, id: &str, fields: Value) -> Result<DocPath, TestError> {
        self.insert(&format!("institutions/{id}"), fields).await
    }

    /// Read back the fields of a document, `None` when it does not exist.
    pub async fn fields(&self, path: &str) -> Result<Option<Fields>, TestError> {
        let path = DocPath::parse(path)?;
        Ok(self.setup.store.get(&path).await?.map(|doc| doc.fields))
    }

    /// Number of documents directly inside the collection at a `/`-separated path.
    pub async fn count(&self, collection: &str) -> Result<usize, TestError> {
        let collection = CollectionPath::parse(collection)?;
        Ok(self.setup.store.len(&collection).await)
    }
}

fn into_fields(value: Value) -> Fields {
    match value {
        Value::Object(fields) => fields,
        _ => Fields::new(),
    }
}
