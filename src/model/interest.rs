use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a contact-form submission.
///
/// Statuses written by older form versions are kept verbatim in [`InterestStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestStatus {
    #[default]
    Pending,
    Contacted,
    Processed,
    ProcessingFailed,
    Completed,
    #[serde(untagged)]
    Other(String),
}

impl InterestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Contacted => "contacted",
            Self::Processed => "processed",
            Self::ProcessingFailed => "processing_failed",
            Self::Completed => "completed",
            Self::Other(status) => status,
        }
    }
}

impl fmt::Display for InterestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of an `institution_interests/{id}` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestDoc {
    #[serde(default)]
    pub institution_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: InterestStatus,
    #[serde(default)]
    pub processed_at: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub institution_id: Option<String>,
}

/// A contact-form submission with its document ID.
#[derive(Debug, Clone, PartialEq)]
pub struct InstitutionInterest {
    pub id: String,
    pub doc: InterestDoc,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_unrecognised_status_verbatim() {
        let doc: InterestDoc = serde_json::from_value(json!({
            "institutionName": "State University",
            "email": "dean@state.edu",
            "status": "new"
        }))
        .unwrap();

        assert_eq!(doc.status, InterestStatus::Other("new".to_string()));
        assert_eq!(doc.status.as_str(), "new");
        assert_eq!(serde_json::to_value(&doc.status).unwrap(), json!("new"));
    }

    #[test]
    fn decodes_known_statuses() {
        let status: InterestStatus = serde_json::from_value(json!("processing_failed")).unwrap();

        assert_eq!(status, InterestStatus::ProcessingFailed);
    }
}
