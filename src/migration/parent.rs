use tracing::instrument;

use crate::context::SessionContext;
use crate::database::PrimaryStore;
use crate::error::StorageError;
use crate::fallback::kv::KeyValueStore;
use crate::legacy::{self, LegacyAlarms, LegacyParentChild, LegacySurveyResponse, keys};
use crate::models::{
    Gender, NewChildProfile, NewSurveyResponse, ReminderKind, Role, TimeOfDay, User,
    format_alarm_time,
};

/// Parent account: child profiles → brushing records → achievements →
/// reminders → survey responses. Counters for parent-managed children use
/// the child-profile id as owner.
#[instrument(skip_all, fields(username = %ctx.username))]
pub(crate) async fn migrate(
    primary: &PrimaryStore,
    kv: &dyn KeyValueStore,
    ctx: &SessionContext,
) -> Result<(), StorageError> {
    primary.ensure_schema().await?;

    let user = resolve_user(primary, ctx).await?;

    if primary.find_parent_profile_by_user(user.id).await?.is_none() {
        primary
            .create_parent_profile(user.id, ctx.profile_name(), None)
            .await?;
    }

    if let Some(children) = legacy::load::<Vec<LegacyParentChild>>(kv, keys::PARENT_CHILDREN).await?
    {
        for legacy_child in children {
            let child = match primary.find_child_of_parent(user.id, &legacy_child.name).await? {
                Some(child) => child,
                None => {
                    primary
                        .create_child_profile(&NewChildProfile {
                            user_id: None,
                            parent_id: Some(user.id),
                            name: legacy_child.name.clone(),
                            age: legacy_child.age,
                            gender: Gender::from_str(&legacy_child.gender).unwrap_or_default(),
                            avatar_index: legacy_child.avatar_index,
                        })
                        .await?
                }
            };

            for record in &legacy_child.brushing_records {
                primary
                    .create_brushing_record(
                        child.id,
                        record.date,
                        TimeOfDay::from_str(&record.time_of_day).unwrap_or_default(),
                        record.duration_seconds,
                        record.completed,
                    )
                    .await?;
            }

            for (kind, value) in &legacy_child.achievements {
                primary.increment_achievement(child.id, kind, *value).await?;
            }
        }
    }

    if let Some(alarms) = legacy::load::<LegacyAlarms>(kv, keys::PARENT_ALARMS).await? {
        if let Some(alarm) = alarms.morning {
            primary
                .upsert_reminder(
                    user.id,
                    ReminderKind::BrushMorning,
                    &format_alarm_time(alarm.hour, alarm.minute),
                    alarm.message.as_deref().unwrap_or(""),
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
                    alarm.message.as_deref().unwrap_or(""),
                    alarm.enabled,
                )
                .await?;
        }
    }

    if let Some(surveys) =
        legacy::load::<Vec<LegacySurveyResponse>>(kv, keys::PARENT_SURVEYS).await?
    {
        for survey in surveys {
            primary
                .create_survey_response(&NewSurveyResponse {
                    parent_id: user.id,
                    child_name: survey.child_name,
                    submitted_at: Some(survey.timestamp),
                    brushing_frequency: survey.brushing_frequency,
                    supervises_brushing: survey.supervises_brushing,
                    sweets_frequency: survey.sweets_frequency,
                    has_seen_dentist: survey.has_seen_dentist,
                    uses_fluoride: survey.uses_fluoride,
                })
                .await?;
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
        None => primary.create_user(&ctx.username, Role::Parent).await,
    }
}
