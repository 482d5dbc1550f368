use docstore::{id::random_token, to_fields, DocumentStore, StoreError, WriteMode};
use serde_json::{json, Map, Value};

use crate::{
    data::document::{decode_all, department, departments},
    model::department::{Department, DepartmentDoc},
    util::{email::normalize_name, time::now_rfc3339},
};

const SIGNUP_TOKEN_LEN: usize = 24;

pub struct DepartmentRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> DepartmentRepository<'a> {
    /// Creates a new instance of [`DepartmentRepository`]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Departments of an institution, in ID order
    pub async fn list(&self, institution_id: &str) -> Result<Vec<Department>, StoreError> {
        let documents = self.store.list(&departments(institution_id)).await?;

        Ok(decode_all::<DepartmentDoc>(documents)
            .into_iter()
            .map(|(id, doc)| Department {
                id,
                institution_id: institution_id.to_string(),
                doc,
            })
            .collect())
    }

    pub async fn get(
        &self,
        institution_id: &str,
        department_id: &str,
    ) -> Result<Option<Department>, StoreError> {
        let Some(document) = self
            .store
            .get(&department(institution_id, department_id))
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(Department {
            id: document.id().to_string(),
            institution_id: institution_id.to_string(),
            doc: document.decode()?,
        }))
    }

    /// First department whose name matches `name`, ignoring case and surrounding whitespace
    pub async fn find_by_name(
        &self,
        institution_id: &str,
        name: &str,
    ) -> Result<Option<Department>, StoreError> {
        let wanted = normalize_name(name);

        Ok(self
            .list(institution_id)
            .await?
            .into_iter()
            .find(|department| normalize_name(&department.doc.department_name) == wanted))
    }

    /// Creates a department with a generated ID and signup token
    pub async fn create(
        &self,
        institution_id: &str,
        name: &str,
    ) -> Result<Department, StoreError> {
        let doc = DepartmentDoc {
            department_name: name.trim().to_string(),
            institution_id: Some(institution_id.to_string()),
            teacher_id: None,
            student_count: 0,
            signup_token: Some(random_token(SIGNUP_TOKEN_LEN)),
            created_at: Some(now_rfc3339()),
        };

        let path = self
            .store
            .add(&departments(institution_id), to_fields(&doc)?)
            .await?;

        Ok(Department {
            id: path.id().to_string(),
            institution_id: institution_id.to_string(),
            doc,
        })
    }

    /// Returns the department named `name`, creating it when no department matches
    ///
    /// # Returns
    /// - `Ok((Department, true))` - The department was created
    /// - `Ok((Department, false))` - An existing department was reused
    pub async fn find_or_create(
        &self,
        institution_id: &str,
        name: &str,
    ) -> Result<(Department, bool), StoreError> {
        if let Some(existing) = self.find_by_name(institution_id, name).await? {
            return Ok((existing, false));
        }

        let created = self.create(institution_id, name).await?;
        tracing::info!(
            "Created department \"{}\" ({}) in institution {}",
            created.doc.department_name,
            created.id,
            institution_id
        );

        Ok((created, true))
    }

    /// Adds one to `studentCount`, returning the new count
    ///
    /// Read-modify-write without a transaction, concurrent writers may lose increments.
    pub async fn increment_student_count(
        &self,
        institution_id: &str,
        department_id: &str,
    ) -> Result<i64, StoreError> {
        let current = self
            .get(institution_id, department_id)
            .await?
            .map(|department| department.doc.student_count)
            .unwrap_or(0);
        let count = current + 1;

        self.merge(institution_id, department_id, json!({ "studentCount": count }))
            .await?;

        Ok(count)
    }

    pub async fn set_teacher(
        &self,
        institution_id: &str,
        department_id: &str,
        teacher_id: &str,
    ) -> Result<(), StoreError> {
        self.merge(institution_id, department_id, json!({ "teacherId": teacher_id }))
            .await
    }

    async fn merge(
        &self,
        institution_id: &str,
        department_id: &str,
        fields: Value,
    ) -> Result<(), StoreError> {
        let mut fields = match fields {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        fields.insert("updatedAt".to_string(), json!(now_rfc3339()));

        self.store
            .set(
                &department(institution_id, department_id),
                fields,
                WriteMode::Merge,
            )
            .await
    }
}
