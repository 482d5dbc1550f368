//! Environment configuration.

use std::{path::PathBuf, time::Duration};

use crate::{error::config::ConfigError, scheduler::config::DEFAULT_SYNC_INTERVAL};

const DEFAULT_DB_PORT: &str = "5432";
const DEFAULT_SIGNUP_BASE_URL: &str = "http://localhost:5173";

/// Where the Firestore access token comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Emulator access, no credentials needed.
    Emulator,
    /// `FIRESTORE_ACCESS_TOKEN`, a token minted elsewhere.
    AccessToken(String),
    /// `FIREBASE_SERVICE_ACCOUNT`, the service account key JSON inline.
    ServiceAccountJson(String),
    /// `GOOGLE_APPLICATION_CREDENTIALS`, path to a service account key file.
    ServiceAccountFile(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub emulator_host: Option<String>,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub firestore: FirestoreConfig,
    pub sync_interval: Duration,
    /// Base of the signup links generated for institutions, without a trailing `/`.
    pub signup_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Variables set to an empty string are treated as unset.
    ///
    /// # Arguments
    /// - `lookup` - Returns the value of an environment variable, if any
    ///
    /// # Returns
    /// - `Ok(Config)` - All required values were found and valid
    /// - `Err(ConfigError)` - A required value is missing or a value failed to parse
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());

        let database_url = match get("DATABASE_URL").or_else(|| get("KOYEB_DATABASE_URL")) {
            Some(url) => url,
            None => compose_database_url(&get)?,
        };

        let project_id = get("FIREBASE_PROJECT_ID")
            .or_else(|| get("VITE_FIREBASE_PROJECT_ID"))
            .ok_or_else(|| ConfigError::MissingEnvVar("FIREBASE_PROJECT_ID".to_string()))?;

        let emulator_host = get("FIRESTORE_EMULATOR_HOST");
        let credentials = if emulator_host.is_some() {
            Credentials::Emulator
        } else if let Some(token) = get("FIRESTORE_ACCESS_TOKEN") {
            Credentials::AccessToken(token)
        } else if let Some(json) = get("FIREBASE_SERVICE_ACCOUNT") {
            Credentials::ServiceAccountJson(json)
        } else if let Some(path) = get("GOOGLE_APPLICATION_CREDENTIALS") {
            Credentials::ServiceAccountFile(PathBuf::from(path))
        } else {
            return Err(ConfigError::MissingEnvVar(
                "FIREBASE_SERVICE_ACCOUNT or GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            ));
        };

        let sync_interval = match get("SYNC_INTERVAL_SECS") {
            Some(raw) => parse_interval(&raw)?,
            None => DEFAULT_SYNC_INTERVAL,
        };

        let signup_base_url = get("SIGNUP_BASE_URL")
            .unwrap_or_else(|| DEFAULT_SIGNUP_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            database_url,
            firestore: FirestoreConfig {
                project_id,
                emulator_host,
                credentials,
            },
            sync_interval,
            signup_base_url,
        })
    }
}

fn compose_database_url<F>(get: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |var: &str| get(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()));

    let host = get("DB_HOST").ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;
    let user = require("DB_USER")?;
    let password = require("DB_PASSWORD")?;
    let name = require("DB_NAME")?;
    let port = get("DB_PORT").unwrap_or_else(|| DEFAULT_DB_PORT.to_string());

    port.parse::<u16>()
        .map_err(|e| ConfigError::InvalidEnvValue {
            var: "DB_PORT".to_string(),
            reason: e.to_string(),
        })?;

    Ok(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
}

fn parse_interval(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvValue {
        var: "SYNC_INTERVAL_SECS".to_string(),
        reason,
    };

    let secs = raw.trim().parse::<u64>().map_err(|e| invalid(e.to_string()))?;
    if secs == 0 {
        return Err(invalid("interval must be at least one second".to_string()));
    }

    Ok(Duration::from_secs(secs))
}
