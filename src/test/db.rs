#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::context::Platform;
    use crate::database::PrimaryStore;
    use crate::error::StorageError;
    use crate::models::{NewHealthRecord, ReminderKind, Role, WarningFlags};

    async fn setup_store() -> PrimaryStore {
        let store = PrimaryStore::new(Platform::Native, "sqlite::memory:");
        store
            .ensure_schema()
            .await
            .expect("Failed to open in-memory database");
        store
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let store = setup_store().await;

        let user = store
            .create_user("sara", Role::Child)
            .await
            .expect("Failed to create user");
        assert_eq!(user.username, "sara");
        assert_eq!(user.role, Role::Child);

        let found = store
            .find_user_by_username("sara")
            .await
            .expect("Lookup failed")
            .expect("User should exist");
        assert_eq!(found.id, user.id);

        let missing = store
            .find_user_by_username("nobody")
            .await
            .expect("Lookup failed");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_constraint_violation() {
        let store = setup_store().await;

        store.create_user("sara", Role::Child).await.unwrap();
        let err = store.create_user("sara", Role::Parent).await.unwrap_err();

        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_use_before_ensure_schema_fails() {
        let store = PrimaryStore::new(Platform::Native, "sqlite::memory:");

        let err = store.find_user_by_username("sara").await.unwrap_err();
        assert!(matches!(err, StorageError::NotInitialized(_)));
    }

    #[tokio::test]
    async fn test_web_platform_fails_fast() {
        let store = PrimaryStore::new(Platform::Web, "sqlite::memory:");

        let err = store.ensure_schema().await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));

        let err = store.find_user_by_username("sara").await.unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let store = setup_store().await;
        store.ensure_schema().await.expect("Second call must succeed");
        store.ensure_schema().await.expect("Third call must succeed");

        store.create_user("sara", Role::Child).await.unwrap();
        assert!(
            store
                .find_user_by_username("sara")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_reminder_slot_is_unique_per_user_and_kind() {
        let store = setup_store().await;
        let user = store.create_user("sara", Role::Child).await.unwrap();

        let first = store
            .upsert_reminder(user.id, ReminderKind::BrushMorning, "07:00", "brush!", true)
            .await
            .unwrap();
        let second = store
            .upsert_reminder(user.id, ReminderKind::BrushMorning, "07:30", "brush!", false)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);

        let reminders = store.list_reminders_by_user(user.id).await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].time, "07:30");
        assert!(!reminders[0].enabled);
    }

    #[tokio::test]
    async fn test_health_record_roundtrip_and_resolution() {
        let store = setup_store().await;
        let caretaker = store.create_user("teacher1", Role::Teacher).await.unwrap();
        let school = store
            .create_school(&crate::models::NewSchool {
                caretaker_id: caretaker.id,
                name: "Shahid Beheshti".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let student = store
            .create_student(school.id, "Amir", 8, 2)
            .await
            .unwrap();

        let record = store
            .create_health_record(&NewHealthRecord {
                student_id: student.id,
                date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                has_brushed: true,
                has_healthy_gums: false,
                score: 4,
                notes: "sensitive molar".to_string(),
                warning_flags: WarningFlags {
                    severe_pain: true,
                    ..Default::default()
                },
                needs_referral: true,
                ..Default::default()
            })
            .await
            .unwrap();

        let listed = store
            .list_health_records_by_student(student.id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0], record);
        assert!(listed[0].warning_flags.severe_pain);
        assert!(!listed[0].resolved);

        let updated = store
            .update_health_record_resolution(record.id, true)
            .await
            .unwrap();
        assert!(updated);

        let listed = store
            .list_health_records_by_student(student.id)
            .await
            .unwrap();
        assert!(listed[0].resolved);
    }

    #[tokio::test]
    async fn test_achievement_counter_never_goes_negative() {
        let store = setup_store().await;

        assert_eq!(store.get_achievement(1, "stars").await.unwrap(), 0);
        assert_eq!(store.increment_achievement(1, "stars", 3).await.unwrap(), 3);
        assert_eq!(
            store.increment_achievement(1, "stars", -10).await.unwrap(),
            0
        );
        assert_eq!(store.increment_achievement(1, "stars", 2).await.unwrap(), 2);
    }
}
