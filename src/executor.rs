use std::future::Future;

use tracing::warn;

use crate::error::StorageError;

/// Normalize the two backends behind one call contract.
///
/// The primary operation runs first; any failure (not initialized, engine
/// unavailable, constraint, query error) routes the call to the fallback
/// operation, whose result is returned verbatim. The primary is never
/// retried, the two paths are never mixed within one call, and both are
/// expected to produce the same logical shape so a caller cannot tell which
/// path ran. The only error that can escape is one raised by the fallback.
///
/// Each primary/fallback pair must be a self-contained single write: a
/// primary side effect that committed before a later step fails in the same
/// feature is not rolled back here.
pub async fn execute_with_fallback<T, P, F>(primary: P, fallback: F) -> Result<T, StorageError>
where
    P: Future<Output = Result<T, StorageError>>,
    F: Future<Output = Result<T, StorageError>>,
{
    match primary.await {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(error = %err, "Primary store operation failed, using fallback");
            fallback.await
        }
    }
}
