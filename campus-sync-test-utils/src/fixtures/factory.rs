//! Field sets for documents in the legacy collections.
//!
//! Each factory returns plain JSON in the camelCase layout the web client writes, so
//! tests can tweak individual fields before inserting.

use serde_json::{json, Value};

/// Legacy `users/{id}` document with no institution affiliation.
pub fn legacy_user(email: &str, role: &str) -> Value {
    json!({
        "name": "Test User",
        "email": email,
        "role": role,
        "emailVerified": true,
        "createdAt": "2025-01-10T09:00:00Z",
        "updatedAt": "2025-01-10T09:00:00Z",
        "lastLoginAt": "2025-02-01T12:00:00Z",
        "sessionCount": 2,
        "profileCompleted": true
    })
}

/// Legacy `users/{id}` document affiliated with an institution.
///
/// # Arguments
/// - `department` - Department name, omitted from the document when `None`
pub fn affiliated_user(
    email: &str,
    role: &str,
    institution_id: &str,
    department: Option<&str>,
) -> Value {
    let mut user = legacy_user(email, role);
    user["institutionId"] = json!(institution_id);
    if let Some(department) = department {
        user["department"] = json!(department);
    }
    user
}

/// Legacy `institutions/{id}` document as created by the sales form, before migration.
pub fn legacy_institution(name: &str, domain: Option<&str>) -> Value {
    let mut institution = json!({
        "name": name,
        "contactEmail": format!("admin@{}", domain.unwrap_or("example.org")),
        "createdAt": "2025-01-01T00:00:00Z"
    });
    if let Some(domain) = domain {
        institution["domain"] = json!(domain);
    }
    institution
}

/// `institution_interests/{id}` document.
pub fn interest(institution_name: &str, email: &str, status: &str) -> Value {
    json!({
        "institutionName": institution_name,
        "contactName": "Pat Contact",
        "email": email,
        "status": status,
        "createdAt": "2025-01-05T10:00:00Z"
    })
}
