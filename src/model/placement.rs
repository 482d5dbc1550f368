use std::fmt;

use serde::Serialize;

use crate::model::role::Role;

/// Role of a user who belongs to no institution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalRole {
    Student,
    Teacher,
}

impl From<ExternalRole> for Role {
    fn from(role: ExternalRole) -> Self {
        match role {
            ExternalRole::Student => Role::Student,
            ExternalRole::Teacher => Role::Teacher,
        }
    }
}

/// Where a user lives in the hierarchy. Each variant carries exactly the identifiers its
/// location needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    /// `platformAdmins/{uid}`
    PlatformAdmin,
    /// `externalUsers/{uid}`
    External { role: ExternalRole },
    /// `institutions/{institution_id}/admins/{uid}`
    InstitutionAdmin { institution_id: String },
    /// `institutions/{institution_id}/departments/{department_id}/teachers/{uid}`
    Teacher {
        institution_id: String,
        department_id: String,
    },
    /// `institutions/{institution_id}/departments/{department_id}/students/{uid}`
    Student {
        institution_id: String,
        department_id: String,
    },
}

impl Placement {
    pub fn role(&self) -> Role {
        match self {
            Self::PlatformAdmin => Role::PlatformAdmin,
            Self::External { role } => (*role).into(),
            Self::InstitutionAdmin { .. } => Role::InstitutionAdmin,
            Self::Teacher { .. } => Role::Teacher,
            Self::Student { .. } => Role::Student,
        }
    }

    pub fn institution_id(&self) -> Option<&str> {
        match self {
            Self::PlatformAdmin | Self::External { .. } => None,
            Self::InstitutionAdmin { institution_id }
            | Self::Teacher { institution_id, .. }
            | Self::Student { institution_id, .. } => Some(institution_id),
        }
    }

    pub fn department_id(&self) -> Option<&str> {
        match self {
            Self::PlatformAdmin | Self::External { .. } | Self::InstitutionAdmin { .. } => None,
            Self::Teacher { department_id, .. } | Self::Student { department_id, .. } => {
                Some(department_id)
            }
        }
    }

    /// Short label used to group report counts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PlatformAdmin => "platform admin",
            Self::External { .. } => "external user",
            Self::InstitutionAdmin { .. } => "institution admin",
            Self::Teacher { .. } => "teacher",
            Self::Student { .. } => "student",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlatformAdmin => write!(f, "platform admin"),
            Self::External { role } => write!(f, "external {}", Role::from(*role)),
            Self::InstitutionAdmin { institution_id } => {
                write!(f, "admin of institution {institution_id}")
            }
            Self::Teacher {
                institution_id,
                department_id,
            } => write!(
                f,
                "teacher in department {department_id} of institution {institution_id}"
            ),
            Self::Student {
                institution_id,
                department_id,
            } => write!(
                f,
                "student in department {department_id} of institution {institution_id}"
            ),
        }
    }
}
