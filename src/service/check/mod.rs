//! Consistency checks between the document hierarchy and the relational mirror.
//!
//! Every checker works on a [`Snapshot`]: both stores are read in full once, indexed by
//! natural key (institution name, email, email domain), and the checks themselves are
//! plain functions over that snapshot. Findings are report entries, never errors.

pub mod contact_form;
pub mod cross_reference;
pub mod missing_users;
pub mod validation;

use std::collections::HashMap;

use docstore::DocumentStore;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    data::{
        document::{institution::InstitutionDocRepository, interest::InterestRepository},
        relational::{
            institution::InstitutionRepository, session_pool::SessionPoolRepository,
            user::UserRepository,
        },
    },
    error::Error,
    model::{
        db::{InstitutionModel, SessionPoolModel, UserModel},
        institution::Institution,
        interest::InstitutionInterest,
        user::LocatedUser,
    },
    service::lookup::LookupService,
    util::email::{normalize_email, normalize_name},
};

/// Both stores, read once and indexed by natural key.
///
/// When several records share a key the first one in load order wins.
pub struct Snapshot {
    institution_docs: Vec<Institution>,
    members: Vec<LocatedUser>,
    interests: Vec<InstitutionInterest>,
    institutions: Vec<InstitutionModel>,
    users: Vec<UserModel>,
    session_pools: Vec<SessionPoolModel>,

    institution_docs_by_id: HashMap<String, usize>,
    institution_docs_by_name: HashMap<String, usize>,
    members_by_email: HashMap<String, usize>,
    institutions_by_id: HashMap<Uuid, usize>,
    institutions_by_name: HashMap<String, usize>,
    institutions_by_domain: HashMap<String, usize>,
    users_by_email: HashMap<String, usize>,
}

impl Snapshot {
    /// Reads institutions, hierarchy members and interests from the document store and
    /// institutions, users and session pools from the relational database
    pub async fn load(store: &dyn DocumentStore, db: &DatabaseConnection) -> Result<Self, Error> {
        let institution_docs = InstitutionDocRepository::new(store).list().await?;
        let members = LookupService::new(store).list_all_users().await?;
        let interests = InterestRepository::new(store).list().await?;

        let institutions = InstitutionRepository::new(db).all().await?;
        let users = UserRepository::new(db).all().await?;
        let session_pools = SessionPoolRepository::new(db).all().await?;

        tracing::debug!(
            "Loaded snapshot: {} institution document(s), {} member(s), {} interest(s), \
             {} institution row(s), {} user row(s), {} session pool(s)",
            institution_docs.len(),
            members.len(),
            interests.len(),
            institutions.len(),
            users.len(),
            session_pools.len()
        );

        Ok(Self::new(
            institution_docs,
            members,
            interests,
            institutions,
            users,
            session_pools,
        ))
    }

    pub fn new(
        institution_docs: Vec<Institution>,
        members: Vec<LocatedUser>,
        interests: Vec<InstitutionInterest>,
        institutions: Vec<InstitutionModel>,
        users: Vec<UserModel>,
        session_pools: Vec<SessionPoolModel>,
    ) -> Self {
        let institution_docs_by_id = index(&institution_docs, |i| Some(i.id.clone()));
        let institution_docs_by_name = index(&institution_docs, |i| name_key(&i.doc.name));
        let members_by_email = index(&members, |m| email_key(&m.user.email));
        let institutions_by_id = index(&institutions, |i| Some(i.id));
        let institutions_by_name = index(&institutions, |i| name_key(&i.name));
        let institutions_by_domain =
            index(&institutions, |i| i.domain.as_deref().and_then(domain_key));
        let users_by_email = index(&users, |u| email_key(&u.email));

        Self {
            institution_docs,
            members,
            interests,
            institutions,
            users,
            session_pools,
            institution_docs_by_id,
            institution_docs_by_name,
            members_by_email,
            institutions_by_id,
            institutions_by_name,
            institutions_by_domain,
            users_by_email,
        }
    }

    pub fn institution_docs(&self) -> &[Institution] {
        &self.institution_docs
    }

    pub fn members(&self) -> &[LocatedUser] {
        &self.members
    }

    pub fn interests(&self) -> &[InstitutionInterest] {
        &self.interests
    }

    pub fn institutions(&self) -> &[InstitutionModel] {
        &self.institutions
    }

    pub fn users(&self) -> &[UserModel] {
        &self.users
    }

    pub fn session_pools(&self) -> &[SessionPoolModel] {
        &self.session_pools
    }

    pub fn institution_doc(&self, id: &str) -> Option<&Institution> {
        self.institution_docs_by_id
            .get(id)
            .map(|&i| &self.institution_docs[i])
    }

    pub fn institution_doc_by_name(&self, name: &str) -> Option<&Institution> {
        name_key(name)
            .and_then(|key| self.institution_docs_by_name.get(&key))
            .map(|&i| &self.institution_docs[i])
    }

    pub fn member_by_email(&self, email: &str) -> Option<&LocatedUser> {
        email_key(email)
            .and_then(|key| self.members_by_email.get(&key))
            .map(|&i| &self.members[i])
    }

    pub fn institution(&self, id: Uuid) -> Option<&InstitutionModel> {
        self.institutions_by_id
            .get(&id)
            .map(|&i| &self.institutions[i])
    }

    pub fn institution_by_name(&self, name: &str) -> Option<&InstitutionModel> {
        name_key(name)
            .and_then(|key| self.institutions_by_name.get(&key))
            .map(|&i| &self.institutions[i])
    }

    /// Relational institution whose `domain` equals `domain`, ignoring case
    pub fn institution_by_domain(&self, domain: &str) -> Option<&InstitutionModel> {
        domain_key(domain)
            .and_then(|key| self.institutions_by_domain.get(&key))
            .map(|&i| &self.institutions[i])
    }

    pub fn user_by_email(&self, email: &str) -> Option<&UserModel> {
        email_key(email)
            .and_then(|key| self.users_by_email.get(&key))
            .map(|&i| &self.users[i])
    }
}

fn index<T, K, F>(items: &[T], key: F) -> HashMap<K, usize>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> Option<K>,
{
    let mut map = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        if let Some(k) = key(item) {
            map.entry(k).or_insert(i);
        }
    }
    map
}

fn name_key(name: &str) -> Option<String> {
    let key = normalize_name(name);
    (!key.is_empty()).then_some(key)
}

fn email_key(email: &str) -> Option<String> {
    let key = normalize_email(email);
    (!key.is_empty()).then_some(key)
}

fn domain_key(domain: &str) -> Option<String> {
    let key = domain.trim().trim_start_matches('@').to_lowercase();
    (!key.is_empty()).then_some(key)
}
