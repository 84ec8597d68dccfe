use tracing::instrument;

use crate::context::SessionContext;
use crate::database::PrimaryStore;
use crate::error::StorageError;
use crate::fallback::kv::KeyValueStore;
use crate::legacy::{self, LegacySchool, keys};
use crate::models::{NewHealthRecord, NewSchool, Role, SchoolKind, User};

/// Caretaker roster: schools → students → health records. Students are
/// scoped to their owning school by id; health records carry
/// `needs_referral` exactly as stored in the legacy blob.
#[instrument(skip_all, fields(username = %ctx.username))]
pub(crate) async fn migrate(
    primary: &PrimaryStore,
    kv: &dyn KeyValueStore,
    ctx: &SessionContext,
) -> Result<(), StorageError> {
    primary.ensure_schema().await?;

    let user = resolve_user(primary, ctx).await?;

    if primary.find_teacher_profile_by_user(user.id).await?.is_none() {
        primary
            .create_teacher_profile(user.id, ctx.profile_name(), None)
            .await?;
    }

    let Some(schools) = legacy::load::<Vec<LegacySchool>>(kv, keys::CARETAKER_SCHOOLS).await?
    else {
        return Ok(());
    };

    for legacy_school in schools {
        let school = match primary.find_school(user.id, &legacy_school.name).await? {
            Some(school) => school,
            None => {
                primary
                    .create_school(&NewSchool {
                        caretaker_id: user.id,
                        name: legacy_school.name.clone(),
                        kind: SchoolKind::from_str(&legacy_school.kind).unwrap_or_default(),
                        activity_days: legacy_school.activity_days.clone(),
                    })
                    .await?
            }
        };

        for legacy_student in &legacy_school.students {
            let student = match primary.find_student(school.id, &legacy_student.name).await? {
                Some(student) => student,
                None => {
                    primary
                        .create_student(
                            school.id,
                            &legacy_student.name,
                            legacy_student.age,
                            legacy_student.grade,
                        )
                        .await?
                }
            };

            for record in &legacy_student.health_records {
                primary
                    .create_health_record(&NewHealthRecord {
                        student_id: student.id,
                        date: record.date,
                        has_brushed: record.has_brushed,
                        has_cavity: record.has_cavity,
                        has_healthy_gums: record.has_healthy_gums,
                        score: record.score,
                        notes: record.notes.clone(),
                        warning_flags: record.warning_flags,
                        needs_referral: record.needs_referral,
                        referral_notes: record.referral_notes.clone(),
                        resolved: record.resolved,
                    })
                    .await?;
            }
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
        None => primary.create_user(&ctx.username, Role::Teacher).await,
    }
}
