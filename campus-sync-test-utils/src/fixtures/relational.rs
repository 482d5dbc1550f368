//! Relational mirror insertion utilities.
//!
//! Rows are inserted without any referential checks so tests can model dangling
//! `institution_id` values exactly as they occur in the legacy mirror.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue};
use uuid::Uuid;

use crate::{error::TestError, TestContext};

pub struct RelationalFixtures<'a> {
    pub setup: &'a TestContext,
}

impl<'a> RelationalFixtures<'a> {
    /// Insert an approved, active institution.
    ///
    /// # Arguments
    /// - `name` - Institution name, the natural key used for cross-store matching
    /// - `domain` - Optional email domain used by the domain heuristic
    ///
    /// # Returns
    /// - `Ok(institution::Model)` - The inserted row
    /// - `Err(TestError::DbErr)` - Insert failed
    pub async fn insert_institution(
        &self,
        name: &str,
        domain: Option<&str>,
    ) -> Result<entity::institution::Model, TestError> {
        self.insert_institution_with_status(name, domain, "approved")
            .await
    }

    /// Insert an institution with an explicit approval status.
    pub async fn insert_institution_with_status(
        &self,
        name: &str,
        domain: Option<&str>,
        approval_status: &str,
    ) -> Result<entity::institution::Model, TestError> {
        let now = Utc::now().naive_utc();

        Ok(entity::institution::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            name: ActiveValue::Set(name.to_string()),
            domain: ActiveValue::Set(domain.map(str::to_string)),
            contact_email: ActiveValue::Set(None),
            approval_status: ActiveValue::Set(approval_status.to_string()),
            is_active: ActiveValue::Set(true),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.setup.db)
        .await?)
    }

    /// Insert a user row.
    ///
    /// # Arguments
    /// - `email` - Stored exactly as given
    /// - `role` - Role string, e.g. `institution_admin`
    /// - `institution_id` - Optional institution reference, which need not exist
    ///
    /// # Returns
    /// - `Ok(user::Model)` - The inserted row
    /// - `Err(TestError::DbErr)` - Insert failed, e.g. duplicate email
    pub async fn insert_user(
        &self,
        email: &str,
        role: &str,
        institution_id: Option<Uuid>,
    ) -> Result<entity::user::Model, TestError> {
        let now = Utc::now().naive_utc();

        Ok(entity::user::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            firebase_uid: ActiveValue::Set(None),
            email: ActiveValue::Set(email.to_string()),
            name: ActiveValue::Set(None),
            role: ActiveValue::Set(role.to_string()),
            institution_id: ActiveValue::Set(institution_id),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.setup.db)
        .await?)
    }

    /// Insert a session pool for an institution, which need not exist.
    pub async fn insert_session_pool(
        &self,
        institution_id: Uuid,
        total_sessions: i32,
    ) -> Result<entity::session_pool::Model, TestError> {
        let now = Utc::now().naive_utc();

        Ok(entity::session_pool::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            institution_id: ActiveValue::Set(institution_id),
            total_sessions: ActiveValue::Set(total_sessions),
            used_sessions: ActiveValue::Set(0),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
        .insert(&self.setup.db)
        .await?)
    }
}
