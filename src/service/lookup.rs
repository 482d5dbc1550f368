use docstore::DocumentStore;

use crate::{
    data::document::{
        department::DepartmentRepository,
        institution::InstitutionDocRepository,
        member::{external_role, MemberRepository},
    },
    error::Error,
    model::{
        placement::{ExternalRole, Placement},
        user::{LocatedUser, UserRecord},
    },
};

/// Finds users wherever the hierarchy keeps them.
pub struct LookupService<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> LookupService<'a> {
    /// Creates a new instance of [`LookupService`]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Locates a user by ID
    ///
    /// Probes `platformAdmins`, then `externalUsers`, then for every institution its
    /// `admins` and every department's `teachers` and `students`. The first hit wins.
    ///
    /// # Arguments
    /// - `user_id` - Document ID of the user
    ///
    /// # Returns
    /// - `Ok(Some(LocatedUser))` - The user and where it was found
    /// - `Ok(None)` - No collection holds the user
    /// - `Err(Error)` - A store read failed or the user document is malformed
    pub async fn find_user_by_id(&self, user_id: &str) -> Result<Option<LocatedUser>, Error> {
        let members = MemberRepository::new(self.store);

        if let Some(user) = members.get(&Placement::PlatformAdmin, user_id).await? {
            return Ok(Some(located(user_id, user, Placement::PlatformAdmin)));
        }

        let external = Placement::External {
            role: ExternalRole::Student,
        };
        if let Some(user) = members.get(&external, user_id).await? {
            let placement = Placement::External {
                role: external_role(&user),
            };
            return Ok(Some(located(user_id, user, placement)));
        }

        let institutions = InstitutionDocRepository::new(self.store)
            .list_documents()
            .await?;
        let departments = DepartmentRepository::new(self.store);

        for institution in &institutions {
            let institution_id = institution.id().to_string();

            let admin = Placement::InstitutionAdmin {
                institution_id: institution_id.clone(),
            };
            if let Some(user) = members.get(&admin, user_id).await? {
                return Ok(Some(located(user_id, user, admin)));
            }

            for department in departments.list(&institution_id).await? {
                let teacher = Placement::Teacher {
                    institution_id: institution_id.clone(),
                    department_id: department.id.clone(),
                };
                if let Some(user) = members.get(&teacher, user_id).await? {
                    return Ok(Some(located(user_id, user, teacher)));
                }

                let student = Placement::Student {
                    institution_id: institution_id.clone(),
                    department_id: department.id,
                };
                if let Some(user) = members.get(&student, user_id).await? {
                    return Ok(Some(located(user_id, user, student)));
                }
            }
        }

        tracing::debug!("User {} not found in the hierarchy", user_id);

        Ok(None)
    }

    /// Every user placed in the hierarchy, in probe order
    ///
    /// Documents that fail to decode are logged and left out.
    pub async fn list_all_users(&self) -> Result<Vec<LocatedUser>, Error> {
        let members = MemberRepository::new(self.store);
        let departments = DepartmentRepository::new(self.store);

        let mut users = members.list_platform_admins().await?;
        users.extend(members.list_external().await?);

        let institutions = InstitutionDocRepository::new(self.store)
            .list_documents()
            .await?;

        for institution in &institutions {
            let institution_id = institution.id();
            users.extend(members.list_admins(institution_id).await?);

            for department in departments.list(institution_id).await? {
                users.extend(members.list_teachers(institution_id, &department.id).await?);
                users.extend(members.list_students(institution_id, &department.id).await?);
            }
        }

        Ok(users)
    }
}

fn located(user_id: &str, user: UserRecord, placement: Placement) -> LocatedUser {
    LocatedUser {
        id: user_id.to_string(),
        user,
        placement,
    }
}
