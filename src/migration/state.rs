use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::StorageError;
use crate::fallback::kv::KeyValueStore;

/// The four one-time bulk transforms, each guarded by its own persisted flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationDomain {
    Generic,
    Caretaker,
    Parent,
    Child,
}

impl MigrationDomain {
    pub const ALL: [MigrationDomain; 4] = [
        MigrationDomain::Generic,
        MigrationDomain::Caretaker,
        MigrationDomain::Parent,
        MigrationDomain::Child,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationDomain::Generic => "generic",
            MigrationDomain::Caretaker => "caretaker",
            MigrationDomain::Parent => "parent",
            MigrationDomain::Child => "child",
        }
    }

    /// On-disk flag key; part of the persisted contract with shipped builds.
    pub fn flag_key(&self) -> &'static str {
        match self {
            MigrationDomain::Generic => "dbGenericMigrationCompleted",
            MigrationDomain::Caretaker => "dbCaretakerMigrationCompleted",
            MigrationDomain::Parent => "dbParentMigrationCompleted",
            MigrationDomain::Child => "dbChildMigrationCompleted",
        }
    }
}

/// Explicit owner of the completion flags, injected into the orchestrator.
///
/// Flags live in the fallback key space only and are monotonic: absent →
/// "true", with [`reset_all`] the one sanctioned way back.
///
/// [`reset_all`]: MigrationState::reset_all
#[derive(Clone)]
pub struct MigrationState {
    kv: Arc<dyn KeyValueStore>,
}

impl MigrationState {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    #[instrument(skip(self))]
    pub async fn is_completed(&self, domain: MigrationDomain) -> Result<bool, StorageError> {
        Ok(self.kv.get(domain.flag_key()).await?.as_deref() == Some("true"))
    }

    #[instrument(skip(self))]
    pub async fn mark_completed(&self, domain: MigrationDomain) -> Result<(), StorageError> {
        info!(domain = domain.as_str(), "Marking migration completed");
        self.kv.set(domain.flag_key(), "true").await
    }

    /// Debug-only: clear every flag in one batched write so all domains
    /// re-migrate on next launch, with no partially-reset state possible.
    /// Must never be reachable from user-facing flows.
    #[instrument(skip(self))]
    pub async fn reset_all(&self) -> Result<(), StorageError> {
        warn!("Resetting all migration flags (debug operation)");
        self.kv
            .remove_many(&MigrationDomain::ALL.map(|d| d.flag_key()))
            .await
    }
}
