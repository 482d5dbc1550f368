use std::sync::Arc;

use docstore::{DocumentStore, FirestoreStore, ServiceAccountKey, TokenSource};
use sea_orm::DatabaseConnection;

use crate::{
    config::{Config, Credentials},
    error::Error,
};

/// Connect to the database and run migrations
pub async fn connect_to_database(config: &Config) -> Result<DatabaseConnection, Error> {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.sqlx_logging(false);

    let db = Database::connect(opt).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Build the Firestore client for the configured project and credentials
pub fn build_document_store(config: &Config) -> Result<Arc<dyn DocumentStore>, Error> {
    let firestore = &config.firestore;

    let store = match (&firestore.emulator_host, &firestore.credentials) {
        (Some(host), _) => {
            tracing::info!("Using Firestore emulator at {}", host);
            FirestoreStore::emulator(host, &firestore.project_id)
        }
        (None, Credentials::Emulator) => {
            return Err(Error::InternalError(
                "emulator credentials without FIRESTORE_EMULATOR_HOST".to_string(),
            ));
        }
        (None, Credentials::AccessToken(token)) => {
            FirestoreStore::new(&firestore.project_id, TokenSource::Static(token.clone()))
        }
        (None, Credentials::ServiceAccountJson(json)) => FirestoreStore::with_service_account(
            &firestore.project_id,
            ServiceAccountKey::from_json(json)?,
        ),
        (None, Credentials::ServiceAccountFile(path)) => FirestoreStore::with_service_account(
            &firestore.project_id,
            ServiceAccountKey::from_file(path)?,
        ),
    };

    Ok(Arc::new(store))
}
