use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Approval state of an institution account.
///
/// Values outside the known set are kept verbatim in [`ApprovalStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    #[serde(untagged)]
    Other(String),
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Other(status) => status,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Fields of an `institutions/{id}` document read by the checkers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionDoc {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub approval_status: Option<ApprovalStatus>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub custom_signup_token: Option<String>,
    #[serde(default)]
    pub custom_signup_link: Option<String>,
}

/// Booleans written by hand in the console sometimes arrive as strings; anything else
/// reads as absent.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => s.trim().parse::<bool>().ok(),
        _ => None,
    })
}

/// An institution document with its ID.
#[derive(Debug, Clone, PartialEq)]
pub struct Institution {
    pub id: String,
    pub doc: InstitutionDoc,
}
