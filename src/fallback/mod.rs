//! Flat key-value adapter emulating the relational operation set.
//!
//! Each logical collection is one JSON array under a well-known key. Every
//! operation loads the whole collection, filters or mutates in memory, and
//! persists it back. There is no foreign-key or uniqueness enforcement here;
//! callers check natural keys explicitly before writing, exactly as the
//! pre-relational builds did.

pub mod kv;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::error::StorageError;
use crate::models::*;
use kv::KeyValueStore;

/// Runtime collection keys. `app_users` is shared with the legacy key space;
/// the rest are the flat-store counterparts of the relational tables.
pub mod keys {
    pub const USERS: &str = "app_users";
    pub const CHILD_PROFILES: &str = "child_profiles";
    pub const PARENT_PROFILES: &str = "parent_profiles";
    pub const TEACHER_PROFILES: &str = "teacher_profiles";
    pub const SCHOOLS: &str = "schools";
    pub const STUDENTS: &str = "students";
    pub const HEALTH_RECORDS: &str = "health_records";
    pub const REMINDERS: &str = "reminders";
    pub const BRUSHING_RECORDS: &str = "brushing_records";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const SURVEY_RESPONSES: &str = "survey_responses";
}

pub struct FallbackStore {
    kv: Arc<dyn KeyValueStore>,
    // Serializes every read-modify-write so interleaved callers cannot lose
    // updates; see the achievement counter contract.
    write_lock: Mutex<()>,
}

impl FallbackStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            write_lock: Mutex::new(()),
        }
    }

    pub fn key_value(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        match self.kv.get(key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, rows: &[T]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(rows)?;
        self.kv.set(key, &raw).await
    }

    fn next_id<T>(rows: &[T], id_of: impl Fn(&T) -> i64) -> i64 {
        rows.iter().map(&id_of).max().unwrap_or(0) + 1
    }

    // --- users ---

    #[instrument(skip(self))]
    pub async fn create_user(&self, username: &str, role: Role) -> Result<User, StorageError> {
        info!("Creating user in fallback store");
        let _guard = self.write_lock.lock().await;

        let mut users: Vec<User> = self.read(keys::USERS).await?;
        if users.iter().any(|u| u.username == username) {
            return Err(StorageError::Constraint(format!(
                "username '{}' already exists",
                username
            )));
        }

        let user = User {
            id: Self::next_id(&users, |u: &User| u.id),
            username: username.to_string(),
            role,
            created_at: Utc::now(),
        };
        users.push(user.clone());
        self.write(keys::USERS, &users).await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> Result<User, StorageError> {
        let users: Vec<User> = self.read(keys::USERS).await?;
        users
            .into_iter()
            .find(|u| u.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("user {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, StorageError> {
        let users: Vec<User> = self.read(keys::USERS).await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    // --- child profiles ---

    #[instrument(skip(self, profile))]
    pub async fn create_child_profile(
        &self,
        profile: &NewChildProfile,
    ) -> Result<ChildProfile, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<ChildProfile> = self.read(keys::CHILD_PROFILES).await?;
        let row = ChildProfile {
            id: Self::next_id(&rows, |r: &ChildProfile| r.id),
            user_id: profile.user_id,
            parent_id: profile.parent_id,
            name: profile.name.clone(),
            age: profile.age,
            gender: profile.gender,
            avatar_index: profile.avatar_index,
        };
        rows.push(row.clone());
        self.write(keys::CHILD_PROFILES, &rows).await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn find_child_profile_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<ChildProfile>, StorageError> {
        let rows: Vec<ChildProfile> = self.read(keys::CHILD_PROFILES).await?;
        Ok(rows.into_iter().find(|r| r.user_id == Some(user_id)))
    }

    #[instrument(skip(self))]
    pub async fn find_child_of_parent(
        &self,
        parent_id: i64,
        name: &str,
    ) -> Result<Option<ChildProfile>, StorageError> {
        let rows: Vec<ChildProfile> = self.read(keys::CHILD_PROFILES).await?;
        Ok(rows
            .into_iter()
            .find(|r| r.parent_id == Some(parent_id) && r.name == name))
    }

    #[instrument(skip(self))]
    pub async fn list_children_of_parent(
        &self,
        parent_id: i64,
    ) -> Result<Vec<ChildProfile>, StorageError> {
        let rows: Vec<ChildProfile> = self.read(keys::CHILD_PROFILES).await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.parent_id == Some(parent_id))
            .collect())
    }

    // --- parent / teacher profiles ---

    #[instrument(skip(self))]
    pub async fn create_parent_profile(
        &self,
        user_id: i64,
        name: &str,
        phone: Option<&str>,
    ) -> Result<ParentProfile, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<ParentProfile> = self.read(keys::PARENT_PROFILES).await?;
        let row = ParentProfile {
            id: Self::next_id(&rows, |r: &ParentProfile| r.id),
            user_id,
            name: name.to_string(),
            phone: phone.map(str::to_string),
        };
        rows.push(row.clone());
        self.write(keys::PARENT_PROFILES, &rows).await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn find_parent_profile_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<ParentProfile>, StorageError> {
        let rows: Vec<ParentProfile> = self.read(keys::PARENT_PROFILES).await?;
        Ok(rows.into_iter().find(|r| r.user_id == user_id))
    }

    #[instrument(skip(self))]
    pub async fn create_teacher_profile(
        &self,
        user_id: i64,
        name: &str,
        school_name: Option<&str>,
    ) -> Result<TeacherProfile, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<TeacherProfile> = self.read(keys::TEACHER_PROFILES).await?;
        let row = TeacherProfile {
            id: Self::next_id(&rows, |r: &TeacherProfile| r.id),
            user_id,
            name: name.to_string(),
            school_name: school_name.map(str::to_string),
        };
        rows.push(row.clone());
        self.write(keys::TEACHER_PROFILES, &rows).await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn find_teacher_profile_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<TeacherProfile>, StorageError> {
        let rows: Vec<TeacherProfile> = self.read(keys::TEACHER_PROFILES).await?;
        Ok(rows.into_iter().find(|r| r.user_id == user_id))
    }

    // --- schools / students ---

    #[instrument(skip(self, school))]
    pub async fn create_school(&self, school: &NewSchool) -> Result<School, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<School> = self.read(keys::SCHOOLS).await?;
        let row = School {
            id: Self::next_id(&rows, |r: &School| r.id),
            caretaker_id: school.caretaker_id,
            name: school.name.clone(),
            kind: school.kind,
            activity_days: school.activity_days.clone(),
        };
        rows.push(row.clone());
        self.write(keys::SCHOOLS, &rows).await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn find_school(
        &self,
        caretaker_id: i64,
        name: &str,
    ) -> Result<Option<School>, StorageError> {
        let rows: Vec<School> = self.read(keys::SCHOOLS).await?;
        Ok(rows
            .into_iter()
            .find(|r| r.caretaker_id == caretaker_id && r.name == name))
    }

    #[instrument(skip(self))]
    pub async fn list_schools_by_caretaker(
        &self,
        caretaker_id: i64,
    ) -> Result<Vec<School>, StorageError> {
        let rows: Vec<School> = self.read(keys::SCHOOLS).await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.caretaker_id == caretaker_id)
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn create_student(
        &self,
        school_id: i64,
        name: &str,
        age: i64,
        grade: i64,
    ) -> Result<Student, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<Student> = self.read(keys::STUDENTS).await?;
        let row = Student {
            id: Self::next_id(&rows, |r: &Student| r.id),
            school_id,
            name: name.to_string(),
            age,
            grade,
        };
        rows.push(row.clone());
        self.write(keys::STUDENTS, &rows).await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn find_student(
        &self,
        school_id: i64,
        name: &str,
    ) -> Result<Option<Student>, StorageError> {
        let rows: Vec<Student> = self.read(keys::STUDENTS).await?;
        Ok(rows
            .into_iter()
            .find(|r| r.school_id == school_id && r.name == name))
    }

    #[instrument(skip(self))]
    pub async fn list_students_by_school(
        &self,
        school_id: i64,
    ) -> Result<Vec<Student>, StorageError> {
        let rows: Vec<Student> = self.read(keys::STUDENTS).await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.school_id == school_id)
            .collect())
    }

    // --- health records ---

    #[instrument(skip(self, record))]
    pub async fn create_health_record(
        &self,
        record: &NewHealthRecord,
    ) -> Result<HealthRecord, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<HealthRecord> = self.read(keys::HEALTH_RECORDS).await?;
        let row = HealthRecord {
            id: Self::next_id(&rows, |r: &HealthRecord| r.id),
            student_id: record.student_id,
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
        };
        rows.push(row.clone());
        self.write(keys::HEALTH_RECORDS, &rows).await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn update_health_record_resolution(
        &self,
        id: i64,
        resolved: bool,
    ) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<HealthRecord> = self.read(keys::HEALTH_RECORDS).await?;
        let Some(row) = rows.iter_mut().find(|r| r.id == id) else {
            return Ok(false);
        };
        row.resolved = resolved;
        self.write(keys::HEALTH_RECORDS, &rows).await?;
        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn list_health_records_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<HealthRecord>, StorageError> {
        let rows: Vec<HealthRecord> = self.read(keys::HEALTH_RECORDS).await?;
        Ok(rows
            .into_iter()
            .filter(|r| r.student_id == student_id)
            .collect())
    }

    // --- reminders ---

    #[instrument(skip(self))]
    pub async fn upsert_reminder(
        &self,
        user_id: i64,
        kind: ReminderKind,
        time: &str,
        message: &str,
        enabled: bool,
    ) -> Result<Reminder, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<Reminder> = self.read(keys::REMINDERS).await?;
        let row = match rows.iter_mut().find(|r| r.user_id == user_id && r.kind == kind) {
            Some(existing) => {
                existing.time = time.to_string();
                existing.message = message.to_string();
                existing.enabled = enabled;
                existing.clone()
            }
            None => {
                let row = Reminder {
                    id: Self::next_id(&rows, |r: &Reminder| r.id),
                    user_id,
                    kind,
                    time: time.to_string(),
                    message: message.to_string(),
                    enabled,
                };
                rows.push(row.clone());
                row
            }
        };
        self.write(keys::REMINDERS, &rows).await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn list_reminders_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Reminder>, StorageError> {
        let rows: Vec<Reminder> = self.read(keys::REMINDERS).await?;
        Ok(rows.into_iter().filter(|r| r.user_id == user_id).collect())
    }

    // --- brushing records ---

    #[instrument(skip(self))]
    pub async fn create_brushing_record(
        &self,
        child_id: i64,
        date: NaiveDate,
        time_of_day: TimeOfDay,
        duration_seconds: i64,
        completed: bool,
    ) -> Result<BrushingRecord, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<BrushingRecord> = self.read(keys::BRUSHING_RECORDS).await?;
        let row = BrushingRecord {
            id: Self::next_id(&rows, |r: &BrushingRecord| r.id),
            child_id,
            date,
            time_of_day,
            duration_seconds,
            completed,
        };
        rows.push(row.clone());
        self.write(keys::BRUSHING_RECORDS, &rows).await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn list_brushing_records_by_child(
        &self,
        child_id: i64,
    ) -> Result<Vec<BrushingRecord>, StorageError> {
        let rows: Vec<BrushingRecord> = self.read(keys::BRUSHING_RECORDS).await?;
        Ok(rows.into_iter().filter(|r| r.child_id == child_id).collect())
    }

    // --- achievements ---

    /// Read-modify-write under the store lock, which makes the increment one
    /// atomic unit of work under the cooperative scheduling model.
    #[instrument(skip(self))]
    pub async fn increment_achievement(
        &self,
        owner_id: i64,
        kind: &str,
        delta: i64,
    ) -> Result<i64, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<Achievement> = self.read(keys::ACHIEVEMENTS).await?;
        let value = match rows
            .iter_mut()
            .find(|r| r.owner_id == owner_id && r.kind == kind)
        {
            Some(counter) => {
                counter.value = (counter.value + delta).max(0);
                counter.value
            }
            None => {
                let value = delta.max(0);
                rows.push(Achievement {
                    owner_id,
                    kind: kind.to_string(),
                    value,
                });
                value
            }
        };
        self.write(keys::ACHIEVEMENTS, &rows).await?;
        Ok(value)
    }

    #[instrument(skip(self))]
    pub async fn get_achievement(&self, owner_id: i64, kind: &str) -> Result<i64, StorageError> {
        let rows: Vec<Achievement> = self.read(keys::ACHIEVEMENTS).await?;
        Ok(rows
            .into_iter()
            .find(|r| r.owner_id == owner_id && r.kind == kind)
            .map(|r| r.value)
            .unwrap_or(0))
    }

    #[instrument(skip(self))]
    pub async fn list_achievements_by_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<Achievement>, StorageError> {
        let rows: Vec<Achievement> = self.read(keys::ACHIEVEMENTS).await?;
        Ok(rows.into_iter().filter(|r| r.owner_id == owner_id).collect())
    }

    #[instrument(skip(self))]
    pub async fn reset_achievements(&self, owner_id: i64) -> Result<(), StorageError> {
        info!("Resetting achievement counters in fallback store");
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<Achievement> = self.read(keys::ACHIEVEMENTS).await?;
        rows.retain(|r| r.owner_id != owner_id);
        self.write(keys::ACHIEVEMENTS, &rows).await
    }

    // --- surveys ---

    #[instrument(skip(self, response))]
    pub async fn create_survey_response(
        &self,
        response: &NewSurveyResponse,
    ) -> Result<SurveyResponse, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut rows: Vec<SurveyResponse> = self.read(keys::SURVEY_RESPONSES).await?;
        let row = SurveyResponse {
            id: Self::next_id(&rows, |r: &SurveyResponse| r.id),
            parent_id: response.parent_id,
            child_name: response.child_name.clone(),
            submitted_at: response.submitted_at.unwrap_or_else(Utc::now),
            brushing_frequency: response.brushing_frequency.clone(),
            supervises_brushing: response.supervises_brushing,
            sweets_frequency: response.sweets_frequency.clone(),
            has_seen_dentist: response.has_seen_dentist,
            uses_fluoride: response.uses_fluoride,
        };
        rows.push(row.clone());
        self.write(keys::SURVEY_RESPONSES, &rows).await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    pub async fn list_survey_responses_by_parent(
        &self,
        parent_id: i64,
    ) -> Result<Vec<SurveyResponse>, StorageError> {
        let rows: Vec<SurveyResponse> = self.read(keys::SURVEY_RESPONSES).await?;
        Ok(rows.into_iter().filter(|r| r.parent_id == parent_id).collect())
    }
}
