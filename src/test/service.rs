#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::error::StorageError;
    use crate::models::{
        NewChildProfile, NewHealthRecord, NewSchool, ReminderKind, Role, Student, TimeOfDay,
        WarningFlags,
    };
    use crate::service::Storage;
    use crate::test::utils::test_storage::{native_storage, web_storage};

    /// Health records hang off a student row; the foreign key rejects
    /// orphaned inserts on the relational engine.
    async fn enrolled_student(storage: &Storage) -> Student {
        let caretaker = storage.create_user("teacher1", Role::Teacher).await.unwrap();
        let school = storage
            .create_school(NewSchool {
                caretaker_id: caretaker.id,
                name: "Shahid Beheshti".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        storage.create_student(school.id, "Amir", 8, 2).await.unwrap()
    }

    #[tokio::test]
    async fn test_explicit_referral_survives_derivation() {
        let (storage, _) = native_storage().await;
        let student = enrolled_student(&storage).await;

        // All warning flags false, referral explicitly requested.
        let record = storage
            .create_health_record(NewHealthRecord {
                student_id: student.id,
                date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                has_healthy_gums: true,
                score: 6,
                needs_referral: true,
                referral_notes: "parent asked for a check".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(record.needs_referral);

        let listed = storage.health_records_by_student(student.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].needs_referral);

        // The write landed on the relational engine, where the read ran.
        let on_primary = storage
            .primary()
            .list_health_records_by_student(student.id)
            .await
            .unwrap();
        assert_eq!(on_primary.len(), 1);
    }

    #[tokio::test]
    async fn test_referral_derived_from_warning_flags() {
        let (storage, _) = native_storage().await;
        let student = enrolled_student(&storage).await;

        let record = storage
            .create_health_record(NewHealthRecord {
                student_id: student.id,
                date: NaiveDate::from_ymd_opt(2024, 1, 6).unwrap(),
                warning_flags: WarningFlags {
                    bleeding_gums: true,
                    ..Default::default()
                },
                needs_referral: false,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(record.needs_referral);

        let on_primary = storage
            .primary()
            .list_health_records_by_student(student.id)
            .await
            .unwrap();
        assert_eq!(on_primary.len(), 1);
        assert!(on_primary[0].needs_referral);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected_on_fallback_path() {
        let (storage, _) = web_storage().await;

        storage.create_user("amir", Role::Child).await.unwrap();
        let err = storage.create_user("amir", Role::Child).await.unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_ensure_initialized_degrades_quietly_on_web() {
        let (storage, _) = web_storage().await;

        // Primary never opens, but startup must not fail.
        storage.ensure_initialized().await.unwrap();
        storage.create_user("amir", Role::Parent).await.unwrap();
    }

    #[tokio::test]
    async fn test_roster_flow_on_fallback_path() {
        let (storage, _) = web_storage().await;

        let caretaker = storage.create_user("teacher1", Role::Teacher).await.unwrap();
        let school = storage
            .create_school(NewSchool {
                caretaker_id: caretaker.id,
                name: "Valiasr".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let student = storage.create_student(school.id, "Reza", 9, 3).await.unwrap();

        let schools = storage.schools_by_caretaker(caretaker.id).await.unwrap();
        assert_eq!(schools.len(), 1);

        let students = storage.students_by_school(school.id).await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].id, student.id);
    }

    #[tokio::test]
    async fn test_child_features_roundtrip() {
        let (storage, _) = native_storage().await;

        let parent = storage.create_user("p1", Role::Parent).await.unwrap();
        let child = storage
            .create_child_profile(NewChildProfile {
                parent_id: Some(parent.id),
                name: "Niki".to_string(),
                age: 6,
                ..Default::default()
            })
            .await
            .unwrap();

        storage
            .record_brushing(
                child.id,
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                TimeOfDay::Evening,
                120,
                true,
            )
            .await
            .unwrap();

        storage
            .set_reminder(parent.id, ReminderKind::BrushEvening, "20:30", "brush!", true)
            .await
            .unwrap();

        let children = storage.children_of_parent(parent.id).await.unwrap();
        assert_eq!(children.len(), 1);

        let brushings = storage.brushing_records_for_child(child.id).await.unwrap();
        assert_eq!(brushings.len(), 1);
        assert_eq!(brushings[0].duration_seconds, 120);

        let reminders = storage.reminders_for_user(parent.id).await.unwrap();
        assert_eq!(reminders.len(), 1);
    }
}
