//! Test fixture modules for relational rows and documents.
//!
//! - `relational` - rows in the PostgreSQL mirror (institutions, users, session pools)
//! - `document` - documents in the legacy flat collections and in the hierarchy
//! - `factory` - field sets for legacy users, institutions and interests

pub mod document;
pub mod factory;
pub mod relational;

use crate::TestContext;

use self::{document::DocumentFixtures, relational::RelationalFixtures};

impl TestContext {
    pub fn relational<'a>(&'a self) -> RelationalFixtures<'a> {
        RelationalFixtures { setup: self }
    }

    pub fn documents<'a>(&'a self) -> DocumentFixtures<'a> {
        DocumentFixtures { setup: self }
    }
}
