use docstore::{CollectionPath, DocumentStore, Fields, StoreError, WriteMode};

use crate::{
    data::document::{decode_all, member, member_collection},
    model::{
        placement::{ExternalRole, Placement},
        role::Role,
        user::{LocatedUser, UserRecord},
    },
};

/// Users placed in the hierarchy: platform admins, external users, institution admins,
/// teachers and students.
pub struct MemberRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> MemberRepository<'a> {
    /// Creates a new instance of [`MemberRepository`]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Writes the user document at the location `placement` describes, replacing any
    /// document already there
    pub async fn put(
        &self,
        placement: &Placement,
        uid: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.store
            .set(&member(placement, uid), fields, WriteMode::Overwrite)
            .await
    }

    pub async fn get(
        &self,
        placement: &Placement,
        uid: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        match self.store.get(&member(placement, uid)).await? {
            Some(document) => Ok(Some(document.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, placement: &Placement, uid: &str) -> Result<bool, StoreError> {
        Ok(self.store.get(&member(placement, uid)).await?.is_some())
    }

    pub async fn list_platform_admins(&self) -> Result<Vec<LocatedUser>, StoreError> {
        self.list_with(&member_collection(&Placement::PlatformAdmin), |_| {
            Placement::PlatformAdmin
        })
        .await
    }

    /// External users; the role is read from each document, defaulting to student
    pub async fn list_external(&self) -> Result<Vec<LocatedUser>, StoreError> {
        let collection = member_collection(&Placement::External {
            role: ExternalRole::Student,
        });

        self.list_with(&collection, |user| Placement::External {
            role: external_role(user),
        })
        .await
    }

    pub async fn list_admins(&self, institution_id: &str) -> Result<Vec<LocatedUser>, StoreError> {
        let placement = Placement::InstitutionAdmin {
            institution_id: institution_id.to_string(),
        };

        self.list_with(&member_collection(&placement), |_| placement.clone())
            .await
    }

    pub async fn list_teachers(
        &self,
        institution_id: &str,
        department_id: &str,
    ) -> Result<Vec<LocatedUser>, StoreError> {
        let placement = Placement::Teacher {
            institution_id: institution_id.to_string(),
            department_id: department_id.to_string(),
        };

        self.list_with(&member_collection(&placement), |_| placement.clone())
            .await
    }

    pub async fn list_students(
        &self,
        institution_id: &str,
        department_id: &str,
    ) -> Result<Vec<LocatedUser>, StoreError> {
        let placement = Placement::Student {
            institution_id: institution_id.to_string(),
            department_id: department_id.to_string(),
        };

        self.list_with(&member_collection(&placement), |_| placement.clone())
            .await
    }

    async fn list_with<F>(
        &self,
        collection: &CollectionPath,
        placement_for: F,
    ) -> Result<Vec<LocatedUser>, StoreError>
    where
        F: Fn(&UserRecord) -> Placement,
    {
        let documents = self.store.list(collection).await?;

        Ok(decode_all::<UserRecord>(documents)
            .into_iter()
            .map(|(id, user)| LocatedUser {
                placement: placement_for(&user),
                id,
                user,
            })
            .collect())
    }
}

/// Role of an external user document, defaulting to student for anything but teacher.
pub fn external_role(user: &UserRecord) -> ExternalRole {
    match user.parsed_role() {
        Some(Role::Teacher) => ExternalRole::Teacher,
        _ => ExternalRole::Student,
    }
}
