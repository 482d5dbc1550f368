use docstore::Fields;
use serde::{Deserialize, Serialize};

use crate::model::{placement::Placement, role::Role};

/// A user document, in either the legacy flat `users` collection or the hierarchy.
///
/// Only the fields the reconciliation logic reads are typed; everything else
/// (`yearOfStudy`, `sessionCount`, timestamps, ...) is carried in `extra` so documents
/// survive a migration unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    /// Department name chosen at signup, used to place teachers and students.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl UserRecord {
    pub fn parsed_role(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }

    /// `institutionId` when present and non-blank.
    pub fn institution(&self) -> Option<&str> {
        non_blank(self.institution_id.as_deref())
    }

    /// `department` when present and non-blank.
    pub fn department_name(&self) -> Option<&str> {
        non_blank(self.department.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// A user found in the hierarchy together with where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedUser {
    pub id: String,
    pub user: UserRecord,
    pub placement: Placement,
}

impl LocatedUser {
    pub fn role(&self) -> Role {
        self.placement.role()
    }

    pub fn institution_id(&self) -> Option<&str> {
        self.placement.institution_id()
    }

    pub fn department_id(&self) -> Option<&str> {
        self.placement.department_id()
    }
}
