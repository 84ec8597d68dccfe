use tracing::{info, instrument, warn};

use crate::database::PrimaryStore;
use crate::error::StorageError;
use crate::fallback::kv::KeyValueStore;
use crate::legacy::{self, LegacyAccount, keys};
use crate::models::Role;

/// Legacy generic account list → User rows.
#[instrument(skip_all)]
pub(crate) async fn migrate(
    primary: &PrimaryStore,
    kv: &dyn KeyValueStore,
) -> Result<(), StorageError> {
    primary.ensure_schema().await?;

    let Some(accounts) = legacy::load::<Vec<LegacyAccount>>(kv, keys::APP_USERS).await? else {
        info!("No legacy accounts to migrate");
        return Ok(());
    };

    for account in accounts {
        let Some(role) = Role::from_str(&account.role) else {
            warn!(username = %account.username, role = %account.role, "Skipping account with unknown role");
            continue;
        };

        if primary
            .find_user_by_username(&account.username)
            .await?
            .is_none()
        {
            primary.create_user(&account.username, role).await?;
        }
    }

    Ok(())
}
