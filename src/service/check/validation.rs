//! Severity-ranked alerts over both stores.

use std::fmt;

use docstore::DocumentStore;
use sea_orm::DatabaseConnection;

use crate::{
    error::Error,
    model::{institution::ApprovalStatus, role::Role},
    service::check::{missing_users::find_missing_users, Snapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    /// A submission not yet completed has no relational user for its email.
    MissingUser,
    /// A relational user references an institution row that does not exist.
    DanglingInstitutionReference,
    /// A hierarchy member's `institutionId` disagrees with the institution documents.
    DocumentInstitutionMismatch,
    /// An approved relational institution has no institution admin.
    UnlinkedInstitutionAdmin,
    /// A session pool belongs to an institution row that does not exist.
    OrphanedSessionPool,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingUser => "missing_user",
            Self::DanglingInstitutionReference => "dangling_institution_reference",
            Self::DocumentInstitutionMismatch => "document_institution_mismatch",
            Self::UnlinkedInstitutionAdmin => "unlinked_institution_admin",
            Self::OrphanedSessionPool => "orphaned_session_pool",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingUser
            | Self::DanglingInstitutionReference
            | Self::DocumentInstitutionMismatch => Severity::Critical,
            Self::UnlinkedInstitutionAdmin | Self::OrphanedSessionPool => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    /// ID of the offending record.
    pub subject: String,
    pub message: String,
}

impl Alert {
    fn new(kind: AlertKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.severity(),
            self.kind.as_str(),
            self.subject,
            self.message
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub alerts: Vec<Alert>,
}

impl ValidationReport {
    pub fn critical(&self) -> usize {
        self.count(Severity::Critical)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn of_kind(&self, kind: AlertKind) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().filter(move |alert| alert.kind == kind)
    }

    fn count(&self, severity: Severity) -> usize {
        self.alerts
            .iter()
            .filter(|alert| alert.severity() == severity)
            .count()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Validation: {} critical, {} warning(s)",
            self.critical(),
            self.warnings()
        )?;
        for alert in &self.alerts {
            writeln!(f, "  {alert}")?;
        }
        Ok(())
    }
}

pub struct ValidationService<'a> {
    store: &'a dyn DocumentStore,
    db: &'a DatabaseConnection,
}

impl<'a> ValidationService<'a> {
    /// Creates a new instance of [`ValidationService`]
    pub fn new(store: &'a dyn DocumentStore, db: &'a DatabaseConnection) -> Self {
        Self { store, db }
    }

    /// Runs every check and returns the alerts, critical ones first
    pub async fn run(&self) -> Result<ValidationReport, Error> {
        let snapshot = Snapshot::load(self.store, self.db).await?;
        let report = validate(&snapshot);

        for alert in &report.alerts {
            tracing::warn!("{}", alert);
        }
        tracing::info!(
            "Validation finished: {} critical, {} warning(s)",
            report.critical(),
            report.warnings()
        );

        Ok(report)
    }
}

pub fn validate(snapshot: &Snapshot) -> ValidationReport {
    let mut alerts = missing_user_alerts(snapshot);
    alerts.extend(institution_alerts(snapshot));
    alerts.sort_by_key(|alert| std::cmp::Reverse(alert.severity()));

    ValidationReport { alerts }
}

/// One critical alert per submission not yet completed whose email has no relational user
pub fn missing_user_alerts(snapshot: &Snapshot) -> Vec<Alert> {
    find_missing_users(snapshot)
        .into_iter()
        .map(|missing| {
            Alert::new(
                AlertKind::MissingUser,
                missing.interest.id,
                format!(
                    "no user row for {} ({}, status {})",
                    missing.interest.doc.email,
                    missing.interest.doc.institution_name,
                    missing.interest.doc.status
                ),
            )
        })
        .collect()
}

/// Institution-ID consistency: relational references, hierarchy `institutionId` fields,
/// admin coverage of approved institutions and session pool ownership
pub fn institution_alerts(snapshot: &Snapshot) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for user in snapshot.users() {
        if let Some(institution_id) = user.institution_id {
            if snapshot.institution(institution_id).is_none() {
                alerts.push(Alert::new(
                    AlertKind::DanglingInstitutionReference,
                    user.id.to_string(),
                    format!("{} references missing institution {}", user.email, institution_id),
                ));
            }
        }
    }

    for member in snapshot.members() {
        let Some(claimed) = member.user.institution() else {
            continue;
        };

        if snapshot.institution_doc(claimed).is_none() {
            alerts.push(Alert::new(
                AlertKind::DocumentInstitutionMismatch,
                member.id.clone(),
                format!(
                    "{} ({}) names missing institution {}",
                    member.user.email, member.placement, claimed
                ),
            ));
        } else if member.institution_id() != Some(claimed) {
            alerts.push(Alert::new(
                AlertKind::DocumentInstitutionMismatch,
                member.id.clone(),
                format!(
                    "{} names institution {} but is stored as {}",
                    member.user.email, claimed, member.placement
                ),
            ));
        }
    }

    for institution in snapshot.institutions() {
        if institution.approval_status != ApprovalStatus::Approved.as_str() {
            continue;
        }

        let has_admin = snapshot.users().iter().any(|user| {
            user.institution_id == Some(institution.id)
                && Role::parse(&user.role) == Some(Role::InstitutionAdmin)
        });
        if !has_admin {
            alerts.push(Alert::new(
                AlertKind::UnlinkedInstitutionAdmin,
                institution.id.to_string(),
                format!("approved institution \"{}\" has no institution admin", institution.name),
            ));
        }
    }

    for pool in snapshot.session_pools() {
        if snapshot.institution(pool.institution_id).is_none() {
            alerts.push(Alert::new(
                AlertKind::OrphanedSessionPool,
                pool.id.to_string(),
                format!(
                    "session pool of {} sessions belongs to missing institution {}",
                    pool.total_sessions, pool.institution_id
                ),
            ));
        }
    }

    alerts
}
