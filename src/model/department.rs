use serde::{Deserialize, Serialize};

pub const DEFAULT_DEPARTMENT_NAME: &str = "Default Department";

/// Fields of an `institutions/{id}/departments/{id}` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDoc {
    #[serde(default)]
    pub department_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<String>,
    #[serde(default)]
    pub student_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signup_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub id: String,
    pub institution_id: String,
    pub doc: DepartmentDoc,
}
