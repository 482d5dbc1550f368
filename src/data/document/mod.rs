//! Repositories over the document store.
//!
//! Collection layout:
//! - `institutions/{id}`
//! - `institutions/{id}/admins/{uid}`
//! - `institutions/{id}/departments/{id}`
//! - `institutions/{id}/departments/{id}/teachers/{uid}`
//! - `institutions/{id}/departments/{id}/students/{uid}`
//! - `externalUsers/{uid}`, `platformAdmins/{uid}`
//! - `institution_interests/{id}`
//! - `users/{uid}`, the legacy flat collection migrated from

pub mod department;
pub mod institution;
pub mod interest;
pub mod legacy_user;
pub mod member;

use docstore::{CollectionPath, DocPath, Document};
use serde::de::DeserializeOwned;

use crate::model::placement::Placement;

pub const INSTITUTIONS: &str = "institutions";
pub const DEPARTMENTS: &str = "departments";
pub const ADMINS: &str = "admins";
pub const TEACHERS: &str = "teachers";
pub const STUDENTS: &str = "students";
pub const EXTERNAL_USERS: &str = "externalUsers";
pub const PLATFORM_ADMINS: &str = "platformAdmins";
pub const INSTITUTION_INTERESTS: &str = "institution_interests";
pub const LEGACY_USERS: &str = "users";

pub fn institutions() -> CollectionPath {
    CollectionPath::root(INSTITUTIONS)
}

pub fn institution(institution_id: &str) -> DocPath {
    institutions().doc(institution_id)
}

pub fn departments(institution_id: &str) -> CollectionPath {
    institution(institution_id).collection(DEPARTMENTS)
}

pub fn department(institution_id: &str, department_id: &str) -> DocPath {
    departments(institution_id).doc(department_id)
}

/// Collection holding users with the given placement.
pub fn member_collection(placement: &Placement) -> CollectionPath {
    match placement {
        Placement::PlatformAdmin => CollectionPath::root(PLATFORM_ADMINS),
        Placement::External { .. } => CollectionPath::root(EXTERNAL_USERS),
        Placement::InstitutionAdmin { institution_id } => {
            institution(institution_id).collection(ADMINS)
        }
        Placement::Teacher {
            institution_id,
            department_id,
        } => department(institution_id, department_id).collection(TEACHERS),
        Placement::Student {
            institution_id,
            department_id,
        } => department(institution_id, department_id).collection(STUDENTS),
    }
}

pub fn member(placement: &Placement, uid: &str) -> DocPath {
    member_collection(placement).doc(uid)
}

/// Decodes every document, logging and dropping the ones that do not fit `T`.
///
/// Malformed documents are a data-integrity finding, not a reason to abort a scan.
pub(crate) fn decode_all<T: DeserializeOwned>(documents: Vec<Document>) -> Vec<(String, T)> {
    documents
        .into_iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(value) => Some((doc.id().to_string(), value)),
            Err(e) => {
                tracing::warn!("Skipping malformed document: {}", e);
                None
            }
        })
        .collect()
}
