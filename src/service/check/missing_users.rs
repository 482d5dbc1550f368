//! Contact-form submissions whose contact never got a relational user row.

use std::{collections::HashSet, fmt};

use docstore::DocumentStore;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    error::Error,
    model::{
        interest::{InstitutionInterest, InterestStatus},
        role::Role,
    },
    service::check::Snapshot,
    util::{
        email::{institutional_domain, normalize_email},
        sql::{quote, quote_opt},
    },
};

/// How the institution of a missing user was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    Name,
    Domain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissingUser {
    pub interest: InstitutionInterest,
    /// Relational institution the user would belong to, with how it was found.
    pub institution: Option<(Uuid, String, MatchedBy)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingUserReport {
    pub missing: Vec<MissingUser>,
    /// One `INSERT` per distinct email, for manual review.
    pub sql: Vec<String>,
}

impl fmt::Display for MissingUserReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Missing users: {}", self.missing.len())?;
        for missing in &self.missing {
            let interest = &missing.interest.doc;
            match &missing.institution {
                Some((_, name, matched_by)) => writeln!(
                    f,
                    "  {} ({}, {}): institution {} by {}",
                    interest.email,
                    missing.interest.id,
                    interest.status,
                    name,
                    match matched_by {
                        MatchedBy::Name => "name",
                        MatchedBy::Domain => "domain",
                    }
                )?,
                None => writeln!(
                    f,
                    "  {} ({}, {}): no institution for \"{}\"",
                    interest.email, missing.interest.id, interest.status, interest.institution_name
                )?,
            }
        }
        if !self.sql.is_empty() {
            writeln!(f)?;
            writeln!(f, "-- Proposed inserts, review before running")?;
            write!(f, "{}", self.sql.join("\n"))?;
        }
        Ok(())
    }
}

pub struct MissingUserService<'a> {
    store: &'a dyn DocumentStore,
    db: &'a DatabaseConnection,
}

impl<'a> MissingUserService<'a> {
    /// Creates a new instance of [`MissingUserService`]
    pub fn new(store: &'a dyn DocumentStore, db: &'a DatabaseConnection) -> Self {
        Self { store, db }
    }

    /// Finds submissions without a relational user and proposes the missing rows
    ///
    /// # Returns
    /// - `Ok(MissingUserReport)` - Missing users and one `INSERT` per distinct email
    /// - `Err(Error)` - Either store could not be read
    pub async fn run(&self) -> Result<MissingUserReport, Error> {
        let snapshot = Snapshot::load(self.store, self.db).await?;
        let missing = find_missing_users(&snapshot);

        let mut seen = HashSet::new();
        let sql = missing
            .iter()
            .filter(|missing| {
                let email = normalize_email(&missing.interest.doc.email);
                !email.is_empty() && seen.insert(email)
            })
            .map(insert_admin_sql)
            .collect::<Vec<_>>();

        tracing::info!(
            "Found {} submission(s) without a relational user",
            missing.len()
        );

        Ok(MissingUserReport { missing, sql })
    }
}

/// Submissions not yet `completed` whose email has no relational user row
pub fn find_missing_users(snapshot: &Snapshot) -> Vec<MissingUser> {
    snapshot
        .interests()
        .iter()
        .filter(|interest| interest.doc.status != InterestStatus::Completed)
        .filter(|interest| snapshot.user_by_email(&interest.doc.email).is_none())
        .map(|interest| MissingUser {
            institution: resolve_institution(snapshot, interest),
            interest: interest.clone(),
        })
        .collect()
}

fn resolve_institution(
    snapshot: &Snapshot,
    interest: &InstitutionInterest,
) -> Option<(Uuid, String, MatchedBy)> {
    if let Some(institution) = snapshot.institution_by_name(&interest.doc.institution_name) {
        return Some((institution.id, institution.name.clone(), MatchedBy::Name));
    }

    institutional_domain(&interest.doc.email)
        .and_then(|domain| snapshot.institution_by_domain(&domain))
        .map(|institution| (institution.id, institution.name.clone(), MatchedBy::Domain))
}

fn insert_admin_sql(missing: &MissingUser) -> String {
    let institution_id = missing
        .institution
        .as_ref()
        .map(|(id, _, _)| quote(&id.to_string()))
        .unwrap_or_else(|| "NULL".to_string());

    format!(
        "INSERT INTO users (id, email, name, role, institution_id, created_at, updated_at) \
         VALUES (gen_random_uuid(), {}, {}, {}, {}, now(), now()) ON CONFLICT (email) DO NOTHING;",
        quote(&normalize_email(&missing.interest.doc.email)),
        quote_opt(missing.interest.doc.contact_name.as_deref()),
        quote(Role::InstitutionAdmin.as_str()),
        institution_id
    )
}
