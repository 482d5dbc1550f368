use docstore::{CollectionPath, DocumentStore, StoreError, WriteMode};
use serde_json::json;

use crate::{
    data::document::{decode_all, INSTITUTION_INTERESTS},
    model::interest::{InstitutionInterest, InterestDoc, InterestStatus},
    util::time::now_rfc3339,
};

pub struct InterestRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> InterestRepository<'a> {
    /// Creates a new instance of [`InterestRepository`]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Every contact-form submission that decodes, in ID order
    pub async fn list(&self) -> Result<Vec<InstitutionInterest>, StoreError> {
        let documents = self
            .store
            .list(&CollectionPath::root(INSTITUTION_INTERESTS))
            .await?;

        Ok(decode_all::<InterestDoc>(documents)
            .into_iter()
            .map(|(id, doc)| InstitutionInterest { id, doc })
            .collect())
    }

    /// Marks a submission as processed and links it to the confirmed user and institution
    pub async fn mark_processed(
        &self,
        interest_id: &str,
        user_id: &str,
        institution_id: &str,
    ) -> Result<(), StoreError> {
        let now = now_rfc3339();
        let fields = json!({
            "status": InterestStatus::Processed.as_str(),
            "userId": user_id,
            "institutionId": institution_id,
            "processedAt": now,
            "updatedAt": now,
        });

        self.store
            .set(
                &CollectionPath::root(INSTITUTION_INTERESTS).doc(interest_id),
                fields.as_object().cloned().unwrap_or_default(),
                WriteMode::Merge,
            )
            .await
    }
}
