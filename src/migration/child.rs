use tracing::instrument;

use crate::context::SessionContext;
use crate::database::PrimaryStore;
use crate::error::StorageError;
use crate::fallback::kv::KeyValueStore;
use crate::legacy::{self, LegacyAchievements, LegacyAlarms, LegacyChildProfile, LegacyGameScores, keys};
use crate::models::{Gender, NewChildProfile, ReminderKind, Role, User, format_alarm_time};

const MORNING_MESSAGE: &str = "Time to brush your teeth!";
const EVENING_MESSAGE: &str = "Brush before bed!";

/// Self-managed child account: profile → achievements → alarms → game
/// scores. Counters use the child's user id as owner.
#[instrument(skip_all, fields(username = %ctx.username))]
pub(crate) async fn migrate(
    primary: &PrimaryStore,
    kv: &dyn KeyValueStore,
    ctx: &SessionContext,
) -> Result<(), StorageError> {
    primary.ensure_schema().await?;

    let user = resolve_user(primary, ctx).await?;

    if let Some(profile) = legacy::load::<LegacyChildProfile>(kv, keys::CHILD_PROFILE).await? {
        if primary.find_child_profile_by_user(user.id).await?.is_none() {
            primary
                .create_child_profile(&NewChildProfile {
                    user_id: Some(user.id),
                    parent_id: None,
                    name: profile.name,
                    age: profile.age,
                    gender: Gender::from_str(&profile.gender).unwrap_or_default(),
                    avatar_index: profile.avatar_index,
                })
                .await?;
        }
    }

    if let Some(achievements) =
        legacy::load::<LegacyAchievements>(kv, keys::CHILD_ACHIEVEMENTS).await?
    {
        for (kind, value) in &achievements {
            primary.increment_achievement(user.id, kind, *value).await?;
        }
    }

    if let Some(alarms) = legacy::load::<LegacyAlarms>(kv, keys::CHILD_ALARMS).await? {
        if let Some(alarm) = alarms.morning {
            primary
                .upsert_reminder(
                    user.id,
                    ReminderKind::BrushMorning,
                    &format_alarm_time(alarm.hour, alarm.minute),
                    alarm.message.as_deref().unwrap_or(MORNING_MESSAGE),
                    alarm.enabled,
                )
                .await?;
        }
        if let Some(alarm) = alarms.evening {
            primary
                .upsert_reminder(
                    user.id,
                    ReminderKind::BrushEvening,
                    &format_alarm_time(alarm.hour, alarm.minute),
                    alarm.message.as_deref().unwrap_or(EVENING_MESSAGE),
                    alarm.enabled,
                )
                .await?;
        }
    }

    if let Some(scores) = legacy::load::<LegacyGameScores>(kv, keys::CHILD_GAME_SCORES).await? {
        for (game, score) in &scores {
            primary.increment_achievement(user.id, game, *score).await?;
        }
    }

    Ok(())
}

async fn resolve_user(
    primary: &PrimaryStore,
    ctx: &SessionContext,
) -> Result<User, StorageError> {
    match primary.find_user_by_username(&ctx.username).await? {
        Some(user) => Ok(user),
        None => primary.create_user(&ctx.username, Role::Child).await,
    }
}
