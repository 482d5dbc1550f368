use docstore::{Document, DocumentStore, Fields, StoreError, WriteMode};

use crate::{
    data::document::{decode_all, institution, institutions},
    model::institution::{Institution, InstitutionDoc},
};

pub struct InstitutionDocRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> InstitutionDocRepository<'a> {
    /// Creates a new instance of [`InstitutionDocRepository`]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Raw institution documents, in ID order
    pub async fn list_documents(&self) -> Result<Vec<Document>, StoreError> {
        self.store.list(&institutions()).await
    }

    /// Every institution document that decodes, in ID order
    pub async fn list(&self) -> Result<Vec<Institution>, StoreError> {
        let documents = self.list_documents().await?;

        Ok(decode_all::<InstitutionDoc>(documents)
            .into_iter()
            .map(|(id, doc)| Institution { id, doc })
            .collect())
    }

    pub async fn get(&self, institution_id: &str) -> Result<Option<Institution>, StoreError> {
        let Some(document) = self.store.get(&institution(institution_id)).await? else {
            return Ok(None);
        };

        Ok(Some(Institution {
            id: document.id().to_string(),
            doc: document.decode()?,
        }))
    }

    pub async fn exists(&self, institution_id: &str) -> Result<bool, StoreError> {
        Ok(self.store.get(&institution(institution_id)).await?.is_some())
    }

    /// Writes `fields` onto the institution document, keeping fields not mentioned
    pub async fn merge(&self, institution_id: &str, fields: Fields) -> Result<(), StoreError> {
        self.store
            .set(&institution(institution_id), fields, WriteMode::Merge)
            .await
    }
}
