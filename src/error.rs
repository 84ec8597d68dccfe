use thiserror::Error;
use tracing::{error, warn};

/// Error taxonomy for the storage layer.
///
/// `NotInitialized`, `Connection` and `Constraint` are raised by the primary
/// store and are normally consumed at the fallback-executor boundary; the
/// only storage error a feature should ever observe is one raised by the
/// fallback path itself.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage not initialized: {0}")]
    NotInitialized(String),

    #[error("storage connection error: {0}")]
    Connection(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StorageError {
    pub fn log_and_record(&self, ctx: &str) {
        let message = self.to_string();
        match self {
            StorageError::NotInitialized(msg) => {
                warn!(message = %msg, context = %ctx, "Primary store not initialized");
            }
            StorageError::Connection(msg) => {
                warn!(message = %msg, context = %ctx, "Storage connection error");
            }
            StorageError::Constraint(msg) => {
                warn!(message = %msg, context = %ctx, "Constraint violation");
            }
            StorageError::NotFound(msg) => {
                warn!(message = %msg, context = %ctx, "Not found");
            }
            StorageError::Serialization(err) => {
                error!(error = %message, context = %ctx, serde_error = %err, "Serialization error");
            }
            StorageError::Database(err) => {
                error!(error = %message, context = %ctx, db_error = %err, "Database error");
            }
        }
    }
}
