//! Contact-form submissions connected to the users and institutions they led to.

use std::fmt;

use docstore::DocumentStore;
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::{
    data::{
        document::interest::InterestRepository,
        relational::reconciliation_log::ReconciliationLogRepository,
    },
    error::Error,
    model::{
        institution::Institution,
        interest::{InstitutionInterest, InterestStatus},
        reconciliation::{LogStatus, Operation},
        user::LocatedUser,
    },
    service::check::Snapshot,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    /// A hierarchy user with the submission's email and an institution with its name exist.
    Connected {
        user: LocatedUser,
        institution: Institution,
    },
    /// No hierarchy user has the submission's email.
    MissingUser,
    /// The user exists but no institution document has the submission's name.
    MissingInstitution { user: LocatedUser },
    /// The submission is already `processed` or `completed`.
    AlreadyProcessed,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::MissingUser => "missing user",
            Self::MissingInstitution { .. } => "missing institution",
            Self::AlreadyProcessed => "already processed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterestConnection {
    pub interest: InstitutionInterest,
    pub status: ConnectionStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactFormReport {
    pub connections: Vec<InterestConnection>,
    pub repaired: usize,
    pub repair_failures: usize,
}

impl ContactFormReport {
    pub fn count(&self, label: &str) -> usize {
        self.connections
            .iter()
            .filter(|connection| connection.status.label() == label)
            .count()
    }
}

impl fmt::Display for ContactFormReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Contact-form connections")?;
        for connection in &self.connections {
            let interest = &connection.interest;
            match &connection.status {
                ConnectionStatus::Connected { user, institution } => writeln!(
                    f,
                    "  {} {} ({}): connected to user {} at {}",
                    interest.id, interest.doc.email, interest.doc.institution_name, user.id, institution.id
                )?,
                status => writeln!(
                    f,
                    "  {} {} ({}): {}",
                    interest.id,
                    interest.doc.email,
                    interest.doc.institution_name,
                    status.label()
                )?,
            }
        }
        write!(
            f,
            "  connected: {}, missing user: {}, missing institution: {}, already processed: {}, repaired: {}, repair failures: {}",
            self.count("connected"),
            self.count("missing user"),
            self.count("missing institution"),
            self.count("already processed"),
            self.repaired,
            self.repair_failures
        )
    }
}

pub struct ContactFormService<'a> {
    store: &'a dyn DocumentStore,
    db: &'a DatabaseConnection,
}

impl<'a> ContactFormService<'a> {
    /// Creates a new instance of [`ContactFormService`]
    pub fn new(store: &'a dyn DocumentStore, db: &'a DatabaseConnection) -> Self {
        Self { store, db }
    }

    /// Classifies every submission and optionally repairs the connected ones
    ///
    /// # Arguments
    /// - `repair` - Mark connected submissions as `processed` and link them to their user
    ///   and institution. Every repair is recorded in the reconciliation log, failed
    ///   repairs do not stop the run.
    ///
    /// # Returns
    /// - `Ok(ContactFormReport)` - One entry per submission
    /// - `Err(Error)` - Either store could not be read
    pub async fn run(&self, repair: bool) -> Result<ContactFormReport, Error> {
        let snapshot = Snapshot::load(self.store, self.db).await?;
        let mut report = ContactFormReport {
            connections: classify_all(&snapshot),
            ..Default::default()
        };

        if repair {
            for connection in &report.connections {
                let ConnectionStatus::Connected { user, institution } = &connection.status else {
                    continue;
                };

                if self
                    .repair(&connection.interest.id, &user.id, &institution.id)
                    .await
                {
                    report.repaired += 1;
                } else {
                    report.repair_failures += 1;
                }
            }
        }

        tracing::info!(
            "Checked {} contact-form submission(s), {} orphaned, {} repaired",
            report.connections.len(),
            report.count("missing user"),
            report.repaired
        );

        Ok(report)
    }

    /// Marks one submission processed and records the attempt, returning whether it succeeded
    async fn repair(&self, interest_id: &str, user_id: &str, institution_id: &str) -> bool {
        let result = InterestRepository::new(self.store)
            .mark_processed(interest_id, user_id, institution_id)
            .await;

        let (status, detail) = match &result {
            Ok(()) => {
                tracing::info!(
                    "Marked submission {} processed for user {} at {}",
                    interest_id,
                    user_id,
                    institution_id
                );
                (LogStatus::Applied, None)
            }
            Err(e) => {
                tracing::error!("Failed to mark submission {} processed: {}", interest_id, e);
                (LogStatus::Failed, Some(e.to_string()))
            }
        };

        let payload = json!({
            "interestId": interest_id,
            "userId": user_id,
            "institutionId": institution_id,
        });
        if let Err(e) = ReconciliationLogRepository::new(self.db)
            .record(
                Operation::MarkInterestProcessed,
                interest_id,
                payload,
                status,
                detail,
            )
            .await
        {
            tracing::error!("Failed to record repair of submission {}: {}", interest_id, e);
        }

        result.is_ok()
    }
}

pub fn classify_all(snapshot: &Snapshot) -> Vec<InterestConnection> {
    snapshot
        .interests()
        .iter()
        .map(|interest| InterestConnection {
            status: classify(snapshot, interest),
            interest: interest.clone(),
        })
        .collect()
}

/// Connection state of one submission: users are found by email among hierarchy members,
/// institutions by normalized name among institution documents
pub fn classify(snapshot: &Snapshot, interest: &InstitutionInterest) -> ConnectionStatus {
    if matches!(
        interest.doc.status,
        InterestStatus::Processed | InterestStatus::Completed
    ) {
        return ConnectionStatus::AlreadyProcessed;
    }

    let Some(user) = snapshot.member_by_email(&interest.doc.email) else {
        return ConnectionStatus::MissingUser;
    };

    match snapshot.institution_doc_by_name(&interest.doc.institution_name) {
        Some(institution) => ConnectionStatus::Connected {
            user: user.clone(),
            institution: institution.clone(),
        },
        None => ConnectionStatus::MissingInstitution { user: user.clone() },
    }
}
