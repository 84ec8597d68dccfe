//! One-time legacy-to-relational migration, one migrator per role domain.
//!
//! Every migrator follows the same state machine: `NotStarted → Completed`,
//! no persisted in-progress state. The persisted flag short-circuits repeat
//! launches; the username/profile/school/student lookups are the second line
//! of defense against duplicated top-level rows if a flag is ever lost.
//! A failure partway leaves the flag unset and the domain retries on the
//! next launch. Per-record child inserts (health records, brushing records)
//! are not individually existence-checked, so a partial failure followed by
//! a successful retry can duplicate those rows.

mod caretaker;
mod child;
mod generic;
mod parent;
pub mod state;

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::context::SessionContext;
use crate::database::PrimaryStore;
use crate::error::StorageError;
use crate::fallback::kv::KeyValueStore;
use crate::models::Role;
use crate::service::Storage;
pub use state::{MigrationDomain, MigrationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Flag already set; no work performed.
    AlreadyCompleted,
    /// All steps ran and the flag is now set.
    Completed,
    /// A step failed; the flag stays unset and the domain retries next
    /// launch. Never fatal to startup.
    Aborted,
}

pub struct MigrationOrchestrator {
    primary: Arc<PrimaryStore>,
    kv: Arc<dyn KeyValueStore>,
    state: MigrationState,
}

impl MigrationOrchestrator {
    pub fn new(primary: Arc<PrimaryStore>, kv: Arc<dyn KeyValueStore>) -> Self {
        let state = MigrationState::new(kv.clone());
        Self { primary, kv, state }
    }

    pub fn for_storage(storage: &Storage) -> Self {
        Self::new(
            storage.primary().clone(),
            storage.fallback().key_value().clone(),
        )
    }

    pub fn state(&self) -> &MigrationState {
        &self.state
    }

    /// Launch-time entry point: generic accounts first, then the signed-in
    /// role's own domain.
    #[instrument(skip(self, ctx), fields(role = ctx.role.as_str()))]
    pub async fn run_for_session(&self, ctx: &SessionContext) -> MigrationOutcome {
        self.migrate_generic_data_to_database().await;

        match ctx.role {
            Role::Child => self.migrate_child_data_to_database(ctx).await,
            Role::Parent => self.migrate_parent_data_to_database(ctx).await,
            Role::Teacher => self.migrate_caretaker_data_to_database(ctx).await,
        }
    }

    #[instrument(skip(self))]
    pub async fn migrate_generic_data_to_database(&self) -> MigrationOutcome {
        self.guarded(
            MigrationDomain::Generic,
            generic::migrate(&self.primary, self.kv.as_ref()),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn migrate_caretaker_data_to_database(
        &self,
        ctx: &SessionContext,
    ) -> MigrationOutcome {
        self.guarded(
            MigrationDomain::Caretaker,
            caretaker::migrate(&self.primary, self.kv.as_ref(), ctx),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn migrate_parent_data_to_database(&self, ctx: &SessionContext) -> MigrationOutcome {
        self.guarded(
            MigrationDomain::Parent,
            parent::migrate(&self.primary, self.kv.as_ref(), ctx),
        )
        .await
    }

    #[instrument(skip(self, ctx))]
    pub async fn migrate_child_data_to_database(&self, ctx: &SessionContext) -> MigrationOutcome {
        self.guarded(
            MigrationDomain::Child,
            child::migrate(&self.primary, self.kv.as_ref(), ctx),
        )
        .await
    }

    /// Debug-only escape hatch; the only sanctioned way to force
    /// re-migration.
    pub async fn reset_migration_flags(&self) -> Result<(), StorageError> {
        self.state.reset_all().await
    }

    /// Flag guard shared by every domain. Errors are consumed here: a failed
    /// domain logs, leaves its flag unset and reports `Aborted` instead of
    /// propagating into app startup.
    async fn guarded<F>(&self, domain: MigrationDomain, migrate: F) -> MigrationOutcome
    where
        F: Future<Output = Result<(), StorageError>>,
    {
        match self.state.is_completed(domain).await {
            Ok(true) => {
                info!(domain = domain.as_str(), "Migration already completed");
                return MigrationOutcome::AlreadyCompleted;
            }
            Ok(false) => {}
            Err(err) => {
                err.log_and_record("reading migration flag");
                return MigrationOutcome::Aborted;
            }
        }

        match migrate.await {
            Ok(()) => match self.state.mark_completed(domain).await {
                Ok(()) => {
                    info!(domain = domain.as_str(), "Migration completed");
                    MigrationOutcome::Completed
                }
                Err(err) => {
                    err.log_and_record("persisting migration flag");
                    MigrationOutcome::Aborted
                }
            },
            Err(err) => {
                error!(
                    domain = domain.as_str(),
                    error = %err,
                    "Migration aborted, will retry on next launch"
                );
                MigrationOutcome::Aborted
            }
        }
    }
}
