//! Command-line surface of the `campus-sync` binary.

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::{
    config::Config,
    error::Error,
    scheduler::SyncMonitor,
    service::{
        check::{
            contact_form::ContactFormService, cross_reference::CrossReferenceService,
            missing_users::MissingUserService, validation::ValidationService,
        },
        lookup::LookupService,
        migration::MigrationService,
        replay::ReplayService,
    },
    startup,
};

/// `campus-sync` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "campus-sync",
    about = "Migrate the platform's document store into its hierarchy and reconcile it with PostgreSQL",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Migrate the flat `institutions` and `users` collections into the hierarchy.
    Migrate,
    /// Count documents in the flat source collections.
    Stats,
    /// Match institutions and users across both stores and propose SQL fixes.
    CrossReference,
    /// Connect contact-form submissions to their users and institutions.
    ContactForms {
        /// Mark connected submissions as processed.
        #[arg(long)]
        repair: bool,
    },
    /// List submissions whose contact has no relational user and propose inserts.
    MissingUsers,
    /// Run every consistency check and print alerts by severity.
    Validate,
    /// Find a user anywhere in the hierarchy.
    Lookup {
        /// Document ID of the user.
        user_id: String,
    },
    /// Re-run skipped and failed reconciliation log entries.
    Replay,
    /// Run the consistency checks continuously until interrupted.
    Monitor {
        /// Seconds between cycles, overriding `SYNC_INTERVAL_SECS`.
        #[arg(long = "interval-secs", value_name = "secs", value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: Option<u64>,
    },
}

/// Connects to both stores and runs `command`, printing its report to stdout
pub async fn run(command: Command, config: &Config) -> Result<(), Error> {
    let db = startup::connect_to_database(config).await?;
    let store = startup::build_document_store(config)?;

    match command {
        Command::Migrate => {
            let report = MigrationService::new(store.as_ref(), &db, &config.signup_base_url)
                .migrate_all_data()
                .await?;
            println!("{report}");
        }
        Command::Stats => {
            let stats = MigrationService::new(store.as_ref(), &db, &config.signup_base_url)
                .migration_stats()
                .await?;
            println!("{stats}");
        }
        Command::CrossReference => {
            let report = CrossReferenceService::new(store.as_ref(), &db).run().await?;
            println!("{report}");
        }
        Command::ContactForms { repair } => {
            let report = ContactFormService::new(store.as_ref(), &db)
                .run(repair)
                .await?;
            println!("{report}");
        }
        Command::MissingUsers => {
            let report = MissingUserService::new(store.as_ref(), &db).run().await?;
            println!("{report}");
        }
        Command::Validate => {
            let report = ValidationService::new(store.as_ref(), &db).run().await?;
            println!("{report}");
        }
        Command::Lookup { user_id } => {
            match LookupService::new(store.as_ref())
                .find_user_by_id(&user_id)
                .await?
            {
                Some(found) => println!(
                    "{} <{}>: {}",
                    found.id, found.user.email, found.placement
                ),
                None => println!("{user_id}: not found"),
            }
        }
        Command::Replay => {
            let report = ReplayService::new(store.as_ref(), &db, &config.signup_base_url)
                .run()
                .await?;
            println!("{report}");
        }
        Command::Monitor { interval_secs } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.sync_interval);

            let mut monitor = SyncMonitor::new(store, db, interval).await?;
            monitor.start().await?;

            tokio::signal::ctrl_c()
                .await
                .map_err(|e| Error::InternalError(format!("failed to listen for ctrl-c: {e}")))?;
            tracing::info!("Interrupt received, shutting down");

            monitor.shutdown().await?;
        }
    }

    Ok(())
}
