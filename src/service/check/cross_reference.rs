//! Institutions and users matched across the two stores by natural key.

use std::fmt;

use docstore::DocumentStore;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    error::Error,
    model::{
        db::{InstitutionModel, UserModel},
        institution::Institution,
        user::LocatedUser,
    },
    service::check::Snapshot,
    util::{
        email::{institutional_domain, normalize_name},
        sql::{quote, quote_opt},
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionMatch {
    pub name: String,
    pub document_id: String,
    pub relational_id: Uuid,
}

/// A user present in both stores whose institutions disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionMismatch {
    pub email: String,
    pub document_institution: Option<String>,
    pub relational_institution: Option<String>,
}

/// A relational user whose `institution_id` points at no institution row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub user_id: Uuid,
    pub email: String,
    pub institution_id: Uuid,
    /// Institution proposed by the user's email domain.
    pub suggestion: Option<(Uuid, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct CrossReferenceReport {
    pub matched_institutions: Vec<InstitutionMatch>,
    pub institutions_only_in_documents: Vec<Institution>,
    pub institutions_only_in_relational: Vec<InstitutionModel>,
    pub matched_users: usize,
    pub users_only_in_documents: Vec<LocatedUser>,
    pub users_only_in_relational: Vec<UserModel>,
    pub institution_mismatches: Vec<InstitutionMismatch>,
    pub dangling_references: Vec<DanglingReference>,
    /// Statements an operator can review and run to bring the relational mirror in line.
    pub sql: Vec<String>,
}

impl CrossReferenceReport {
    pub fn is_consistent(&self) -> bool {
        self.institutions_only_in_documents.is_empty()
            && self.institutions_only_in_relational.is_empty()
            && self.users_only_in_documents.is_empty()
            && self.users_only_in_relational.is_empty()
            && self.institution_mismatches.is_empty()
            && self.dangling_references.is_empty()
    }
}

impl fmt::Display for CrossReferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cross-reference report")?;
        writeln!(f, "  institutions matched: {}", self.matched_institutions.len())?;
        for institution in &self.institutions_only_in_documents {
            writeln!(
                f,
                "  institution only in documents: {} ({})",
                institution.doc.name, institution.id
            )?;
        }
        for institution in &self.institutions_only_in_relational {
            writeln!(
                f,
                "  institution only in relational: {} ({})",
                institution.name, institution.id
            )?;
        }

        writeln!(f, "  users matched: {}", self.matched_users)?;
        for user in &self.users_only_in_documents {
            writeln!(
                f,
                "  user only in documents: {} ({}, {})",
                user.user.email, user.id, user.placement
            )?;
        }
        for user in &self.users_only_in_relational {
            writeln!(f, "  user only in relational: {} ({})", user.email, user.role)?;
        }
        for mismatch in &self.institution_mismatches {
            writeln!(
                f,
                "  institution mismatch for {}: documents say {}, relational says {}",
                mismatch.email,
                mismatch.document_institution.as_deref().unwrap_or("none"),
                mismatch.relational_institution.as_deref().unwrap_or("none")
            )?;
        }
        for dangling in &self.dangling_references {
            match &dangling.suggestion {
                Some((_, name)) => writeln!(
                    f,
                    "  dangling institution {} on {}, domain suggests {}",
                    dangling.institution_id, dangling.email, name
                )?,
                None => writeln!(
                    f,
                    "  dangling institution {} on {}, no suggestion",
                    dangling.institution_id, dangling.email
                )?,
            }
        }

        if self.is_consistent() {
            write!(f, "  stores are consistent")?;
        } else if !self.sql.is_empty() {
            writeln!(f)?;
            writeln!(f, "-- Proposed fixes, review before running")?;
            write!(f, "{}", self.sql.join("\n"))?;
        }

        Ok(())
    }
}

pub struct CrossReferenceService<'a> {
    store: &'a dyn DocumentStore,
    db: &'a DatabaseConnection,
}

impl<'a> CrossReferenceService<'a> {
    /// Creates a new instance of [`CrossReferenceService`]
    pub fn new(store: &'a dyn DocumentStore, db: &'a DatabaseConnection) -> Self {
        Self { store, db }
    }

    /// Loads both stores and cross-references them
    ///
    /// # Returns
    /// - `Ok(CrossReferenceReport)` - Matches, differences and proposed SQL
    /// - `Err(Error)` - Either store could not be read
    pub async fn run(&self) -> Result<CrossReferenceReport, Error> {
        let snapshot = Snapshot::load(self.store, self.db).await?;
        let report = cross_reference(&snapshot);

        tracing::info!(
            "Cross-reference: {} institution(s) and {} user(s) matched, {} SQL statement(s) proposed",
            report.matched_institutions.len(),
            report.matched_users,
            report.sql.len()
        );

        Ok(report)
    }
}

/// Matches institutions by normalized name and users by normalized email in both directions
pub fn cross_reference(snapshot: &Snapshot) -> CrossReferenceReport {
    let mut report = CrossReferenceReport::default();

    for institution in snapshot.institution_docs() {
        match snapshot.institution_by_name(&institution.doc.name) {
            Some(row) => report.matched_institutions.push(InstitutionMatch {
                name: institution.doc.name.clone(),
                document_id: institution.id.clone(),
                relational_id: row.id,
            }),
            None => {
                tracing::warn!(
                    "Institution \"{}\" ({}) has no relational row",
                    institution.doc.name,
                    institution.id
                );
                report.sql.push(insert_institution_sql(institution));
                report.institutions_only_in_documents.push(institution.clone());
            }
        }
    }

    for row in snapshot.institutions() {
        if snapshot.institution_doc_by_name(&row.name).is_none() {
            tracing::warn!("Institution row \"{}\" ({}) has no document", row.name, row.id);
            report.institutions_only_in_relational.push(row.clone());
        }
    }

    for member in snapshot.members() {
        let Some(row) = snapshot.user_by_email(&member.user.email) else {
            tracing::warn!(
                "User {} ({}) has no relational row",
                member.user.email,
                member.id
            );
            report.sql.push(insert_user_sql(snapshot, member));
            report.users_only_in_documents.push(member.clone());
            continue;
        };

        report.matched_users += 1;

        // Dangling relational references are reported on their own below.
        if row
            .institution_id
            .is_some_and(|id| snapshot.institution(id).is_none())
        {
            continue;
        }

        let document_institution = member
            .institution_id()
            .map(|id| document_institution_name(snapshot, id));
        let relational_institution = row
            .institution_id
            .and_then(|id| snapshot.institution(id))
            .map(|institution| institution.name.clone());

        let same = match (&document_institution, &relational_institution) {
            (None, None) => true,
            (Some(doc), Some(rel)) => normalize_name(doc) == normalize_name(rel),
            _ => false,
        };
        if !same {
            tracing::warn!(
                "Institution mismatch for {}: {:?} vs {:?}",
                row.email,
                document_institution,
                relational_institution
            );
            report.institution_mismatches.push(InstitutionMismatch {
                email: row.email.clone(),
                document_institution,
                relational_institution,
            });
        }
    }

    for row in snapshot.users() {
        if snapshot.member_by_email(&row.email).is_none() {
            report.users_only_in_relational.push(row.clone());
        }

        let Some(institution_id) = row.institution_id else {
            continue;
        };
        if snapshot.institution(institution_id).is_some() {
            continue;
        }

        let suggestion = institutional_domain(&row.email)
            .and_then(|domain| snapshot.institution_by_domain(&domain))
            .map(|institution| (institution.id, institution.name.clone()));

        tracing::warn!(
            "User {} references missing institution {}",
            row.email,
            institution_id
        );
        if let Some((suggested_id, _)) = &suggestion {
            report.sql.push(format!(
                "UPDATE users SET institution_id = {}, updated_at = now() WHERE id = {};",
                quote(&suggested_id.to_string()),
                quote(&row.id.to_string())
            ));
        }
        report.dangling_references.push(DanglingReference {
            user_id: row.id,
            email: row.email.clone(),
            institution_id,
            suggestion,
        });
    }

    report
}

/// Name of a document institution, falling back to its ID when the document is missing.
fn document_institution_name(snapshot: &Snapshot, institution_id: &str) -> String {
    snapshot
        .institution_doc(institution_id)
        .map(|institution| institution.doc.name.clone())
        .unwrap_or_else(|| institution_id.to_string())
}

fn insert_institution_sql(institution: &Institution) -> String {
    // Unrecognised statuses wait for review instead of being copied into the mirror.
    let approval_status = match &institution.doc.approval_status {
        None => "approved",
        Some(status) if status.is_known() => status.as_str(),
        Some(_) => "pending",
    };

    format!(
        "INSERT INTO institutions (id, name, domain, contact_email, approval_status, is_active, created_at, updated_at) \
         VALUES (gen_random_uuid(), {}, {}, {}, {}, {}, now(), now());",
        quote(&institution.doc.name),
        quote_opt(institution.doc.domain.as_deref()),
        quote_opt(institution.doc.contact_email.as_deref()),
        quote(approval_status),
        institution.doc.is_active.unwrap_or(true)
    )
}

fn insert_user_sql(snapshot: &Snapshot, member: &LocatedUser) -> String {
    let institution = match member
        .institution_id()
        .and_then(|id| snapshot.institution_doc(id))
    {
        Some(institution) => format!(
            "(SELECT id FROM institutions WHERE lower(name) = lower({}) LIMIT 1)",
            quote(institution.doc.name.trim())
        ),
        None => "NULL".to_string(),
    };

    format!(
        "INSERT INTO users (id, firebase_uid, email, name, role, institution_id, created_at, updated_at) \
         VALUES (gen_random_uuid(), {}, {}, {}, {}, {}, now(), now()) ON CONFLICT (email) DO NOTHING;",
        quote(&member.id),
        quote(member.user.email.trim()),
        quote_opt(member.user.name.as_deref()),
        quote(member.role().as_str()),
        institution
    )
}
