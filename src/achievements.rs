//! Counter-update protocol shared by the games and the brushing timer.
//!
//! Both backends implement the increment as one atomic unit of work (an SQL
//! upsert on the primary side, a mutex-guarded read-modify-write on the
//! fallback side), so rapid-fire increments never lose updates.

use crate::database::PrimaryStore;
use crate::error::StorageError;
use crate::executor::execute_with_fallback;
use crate::fallback::FallbackStore;
use crate::models::Achievement;

/// Well-known counter names. Game high scores use the game's own key.
pub mod kinds {
    pub const STARS: &str = "stars";
    pub const DIAMONDS: &str = "diamonds";
    pub const REGULAR_BRUSHING: &str = "regularBrushing";
    pub const HEALTHY_SNACKS: &str = "healthySnacks";
}

/// Add `delta` to the `(owner_id, kind)` counter, creating it at
/// `max(delta, 0)` if absent, and return the new value.
pub async fn update_achievement(
    primary: &PrimaryStore,
    fallback: &FallbackStore,
    owner_id: i64,
    kind: &str,
    delta: i64,
) -> Result<i64, StorageError> {
    execute_with_fallback(
        primary.increment_achievement(owner_id, kind, delta),
        fallback.increment_achievement(owner_id, kind, delta),
    )
    .await
}

pub async fn get_achievement(
    primary: &PrimaryStore,
    fallback: &FallbackStore,
    owner_id: i64,
    kind: &str,
) -> Result<i64, StorageError> {
    execute_with_fallback(
        primary.get_achievement(owner_id, kind),
        fallback.get_achievement(owner_id, kind),
    )
    .await
}

pub async fn list_achievements(
    primary: &PrimaryStore,
    fallback: &FallbackStore,
    owner_id: i64,
) -> Result<Vec<Achievement>, StorageError> {
    execute_with_fallback(
        primary.list_achievements_by_owner(owner_id),
        fallback.list_achievements_by_owner(owner_id),
    )
    .await
}

/// Explicit reset; the only sanctioned way counters decrease.
pub async fn reset_achievements(
    primary: &PrimaryStore,
    fallback: &FallbackStore,
    owner_id: i64,
) -> Result<(), StorageError> {
    execute_with_fallback(
        primary.reset_achievements(owner_id),
        fallback.reset_achievements(owner_id),
    )
    .await
}
