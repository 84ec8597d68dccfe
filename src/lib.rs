//! Local-first persistence and migration layer for the BrushTrack app.
//!
//! Two incompatible backends coexist: a relational SQLite store, available
//! only on the native platform, and a flat key-value store that is always
//! available. Every feature reads and writes through [`Storage`], whose
//! operations try the relational path first and fall back transparently.
//! On top of that sits a one-time, idempotent, per-role migration
//! ([`MigrationOrchestrator`]) that converts years of flat legacy JSON into
//! the relational shape exactly once.

pub mod achievements;
pub mod context;
pub mod database;
pub mod error;
pub mod executor;
pub mod fallback;
pub mod legacy;
pub mod migration;
pub mod models;
pub mod service;
pub mod telemetry;

#[cfg(test)]
mod test;

pub use context::{Platform, SessionContext, StorageBackend};
pub use error::StorageError;
pub use executor::execute_with_fallback;
pub use migration::{MigrationDomain, MigrationOrchestrator, MigrationOutcome, MigrationState};
pub use service::Storage;
