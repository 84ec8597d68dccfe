//! The facade every feature talks to.
//!
//! Each method is one `execute_with_fallback` pair: the same logical
//! operation expressed against the primary store and against the flat
//! fallback store, producing results of identical shape from either path.
//! Errors surface to features only when both paths fail.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::achievements;
use crate::context::StorageBackend;
use crate::database::PrimaryStore;
use crate::error::StorageError;
use crate::executor::execute_with_fallback;
use crate::fallback::FallbackStore;
use crate::models::*;

pub struct Storage {
    primary: Arc<PrimaryStore>,
    fallback: Arc<FallbackStore>,
}

impl Storage {
    pub fn new(backend: StorageBackend) -> Self {
        Self {
            primary: Arc::new(PrimaryStore::new(backend.platform, backend.database_url)),
            fallback: Arc::new(FallbackStore::new(backend.key_value)),
        }
    }

    pub fn primary(&self) -> &Arc<PrimaryStore> {
        &self.primary
    }

    pub fn fallback(&self) -> &Arc<FallbackStore> {
        &self.fallback
    }

    /// Open the relational engine and ensure the schema. A failure here is
    /// not fatal: the app keeps running against the fallback store.
    #[instrument(skip(self))]
    pub async fn ensure_initialized(&self) -> Result<(), StorageError> {
        match self.primary.ensure_schema().await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(error = %err, "Primary store unavailable, running on fallback only");
                Ok(())
            }
        }
    }

    // --- users ---

    /// The username existence check runs through the executor first, so the
    /// duplicate error has the same shape on either path. Only the backend
    /// that will take the write is consulted; a name that exists solely in
    /// the other store after a degraded session is not detected.
    #[instrument(skip(self))]
    pub async fn create_user(&self, username: &str, role: Role) -> Result<User, StorageError> {
        if self.find_user_by_username(username).await?.is_some() {
            return Err(StorageError::Constraint(format!(
                "username '{}' already exists",
                username
            )));
        }

        info!("Creating user");
        execute_with_fallback(
            self.primary.create_user(username, role),
            self.fallback.create_user(username, role),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, StorageError> {
        execute_with_fallback(
            self.primary.find_user_by_username(username),
            self.fallback.find_user_by_username(username),
        )
        .await
    }

    // --- profiles ---

    #[instrument(skip(self, profile))]
    pub async fn create_child_profile(
        &self,
        profile: NewChildProfile,
    ) -> Result<ChildProfile, StorageError> {
        execute_with_fallback(
            self.primary.create_child_profile(&profile),
            self.fallback.create_child_profile(&profile),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn children_of_parent(
        &self,
        parent_id: i64,
    ) -> Result<Vec<ChildProfile>, StorageError> {
        execute_with_fallback(
            self.primary.list_children_of_parent(parent_id),
            self.fallback.list_children_of_parent(parent_id),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn create_parent_profile(
        &self,
        user_id: i64,
        name: &str,
        phone: Option<&str>,
    ) -> Result<ParentProfile, StorageError> {
        execute_with_fallback(
            self.primary.create_parent_profile(user_id, name, phone),
            self.fallback.create_parent_profile(user_id, name, phone),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn create_teacher_profile(
        &self,
        user_id: i64,
        name: &str,
        school_name: Option<&str>,
    ) -> Result<TeacherProfile, StorageError> {
        execute_with_fallback(
            self.primary.create_teacher_profile(user_id, name, school_name),
            self.fallback.create_teacher_profile(user_id, name, school_name),
        )
        .await
    }

    // --- schools / students ---

    #[instrument(skip(self, school))]
    pub async fn create_school(&self, school: NewSchool) -> Result<School, StorageError> {
        execute_with_fallback(
            self.primary.create_school(&school),
            self.fallback.create_school(&school),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn schools_by_caretaker(
        &self,
        caretaker_id: i64,
    ) -> Result<Vec<School>, StorageError> {
        execute_with_fallback(
            self.primary.list_schools_by_caretaker(caretaker_id),
            self.fallback.list_schools_by_caretaker(caretaker_id),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn create_student(
        &self,
        school_id: i64,
        name: &str,
        age: i64,
        grade: i64,
    ) -> Result<Student, StorageError> {
        execute_with_fallback(
            self.primary.create_student(school_id, name, age, grade),
            self.fallback.create_student(school_id, name, age, grade),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn students_by_school(&self, school_id: i64) -> Result<Vec<Student>, StorageError> {
        execute_with_fallback(
            self.primary.list_students_by_school(school_id),
            self.fallback.list_students_by_school(school_id),
        )
        .await
    }

    // --- health records ---

    /// Check-in entry point. `needs_referral` is derived here, at creation
    /// time: an explicitly set flag is honored even when every warning flag
    /// is false.
    #[instrument(skip(self, record))]
    pub async fn create_health_record(
        &self,
        mut record: NewHealthRecord,
    ) -> Result<HealthRecord, StorageError> {
        record.needs_referral = record.needs_referral || record.warning_flags.any();

        execute_with_fallback(
            self.primary.create_health_record(&record),
            self.fallback.create_health_record(&record),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn resolve_health_record(
        &self,
        id: i64,
        resolved: bool,
    ) -> Result<bool, StorageError> {
        execute_with_fallback(
            self.primary.update_health_record_resolution(id, resolved),
            self.fallback.update_health_record_resolution(id, resolved),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn health_records_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<HealthRecord>, StorageError> {
        execute_with_fallback(
            self.primary.list_health_records_by_student(student_id),
            self.fallback.list_health_records_by_student(student_id),
        )
        .await
    }

    // --- reminders ---

    #[instrument(skip(self))]
    pub async fn set_reminder(
        &self,
        user_id: i64,
        kind: ReminderKind,
        time: &str,
        message: &str,
        enabled: bool,
    ) -> Result<Reminder, StorageError> {
        execute_with_fallback(
            self.primary.upsert_reminder(user_id, kind, time, message, enabled),
            self.fallback.upsert_reminder(user_id, kind, time, message, enabled),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn reminders_for_user(&self, user_id: i64) -> Result<Vec<Reminder>, StorageError> {
        execute_with_fallback(
            self.primary.list_reminders_by_user(user_id),
            self.fallback.list_reminders_by_user(user_id),
        )
        .await
    }

    // --- brushing ---

    #[instrument(skip(self))]
    pub async fn record_brushing(
        &self,
        child_id: i64,
        date: NaiveDate,
        time_of_day: TimeOfDay,
        duration_seconds: i64,
        completed: bool,
    ) -> Result<BrushingRecord, StorageError> {
        execute_with_fallback(
            self.primary
                .create_brushing_record(child_id, date, time_of_day, duration_seconds, completed),
            self.fallback
                .create_brushing_record(child_id, date, time_of_day, duration_seconds, completed),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn brushing_records_for_child(
        &self,
        child_id: i64,
    ) -> Result<Vec<BrushingRecord>, StorageError> {
        execute_with_fallback(
            self.primary.list_brushing_records_by_child(child_id),
            self.fallback.list_brushing_records_by_child(child_id),
        )
        .await
    }

    // --- achievements ---

    #[instrument(skip(self))]
    pub async fn update_achievement(
        &self,
        owner_id: i64,
        kind: &str,
        delta: i64,
    ) -> Result<i64, StorageError> {
        achievements::update_achievement(&self.primary, &self.fallback, owner_id, kind, delta)
            .await
    }

    #[instrument(skip(self))]
    pub async fn achievement(&self, owner_id: i64, kind: &str) -> Result<i64, StorageError> {
        achievements::get_achievement(&self.primary, &self.fallback, owner_id, kind).await
    }

    #[instrument(skip(self))]
    pub async fn achievements_for_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<Achievement>, StorageError> {
        achievements::list_achievements(&self.primary, &self.fallback, owner_id).await
    }

    #[instrument(skip(self))]
    pub async fn reset_achievements(&self, owner_id: i64) -> Result<(), StorageError> {
        achievements::reset_achievements(&self.primary, &self.fallback, owner_id).await
    }

    // --- surveys ---

    #[instrument(skip(self, response))]
    pub async fn submit_survey_response(
        &self,
        response: NewSurveyResponse,
    ) -> Result<SurveyResponse, StorageError> {
        execute_with_fallback(
            self.primary.create_survey_response(&response),
            self.fallback.create_survey_response(&response),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn survey_responses_for_parent(
        &self,
        parent_id: i64,
    ) -> Result<Vec<SurveyResponse>, StorageError> {
        execute_with_fallback(
            self.primary.list_survey_responses_by_parent(parent_id),
            self.fallback.list_survey_responses_by_parent(parent_id),
        )
        .await
    }
}
