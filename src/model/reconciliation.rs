//! Vocabulary of the reconciliation log.

use std::fmt;

/// Cross-store operation recorded in the reconciliation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Placing a legacy user into the hierarchy. Payload: `{"userId", "user"}`.
    MigrateUser,
    /// Marking a contact-form submission as processed. Payload:
    /// `{"interestId", "userId", "institutionId"}`.
    MarkInterestProcessed,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MigrateUser => "migrate_user",
            Self::MarkInterestProcessed => "mark_interest_processed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "migrate_user" => Some(Self::MigrateUser),
            "mark_interest_processed" => Some(Self::MarkInterestProcessed),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Pending,
    Applied,
    Skipped,
    Failed,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Applied => "applied",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(Self::Pending),
            "applied" => Some(Self::Applied),
            "skipped" => Some(Self::Skipped),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
