use std::str::FromStr;

use chrono::Utc;
use once_cell::sync::OnceCell;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use crate::context::Platform;
use crate::database::schema::CURRENT_SCHEMA;
use crate::error::StorageError;
use crate::models::*;

/// Relational adapter over the SQLite engine.
///
/// Only usable on the native platform, and only after [`ensure_schema`] has
/// opened the pool. Errors are never swallowed here; the fallback executor is
/// the boundary that decides what a failure means.
///
/// [`ensure_schema`]: PrimaryStore::ensure_schema
pub struct PrimaryStore {
    platform: Platform,
    database_url: String,
    pool: OnceCell<Pool<Sqlite>>,
}

impl PrimaryStore {
    pub fn new(platform: Platform, database_url: impl Into<String>) -> Self {
        Self {
            platform,
            database_url: database_url.into(),
            pool: OnceCell::new(),
        }
    }

    /// Open the engine (first call only) and declare every table with
    /// `CREATE TABLE IF NOT EXISTS` semantics. Safe to call on every launch.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        let pool = match self.pool.get() {
            Some(pool) => pool.clone(),
            None => {
                if !self.platform.is_native() {
                    return Err(StorageError::Connection(
                        "relational engine is unavailable off the native platform".to_string(),
                    ));
                }

                let options = SqliteConnectOptions::from_str(&self.database_url)
                    .map_err(|e| StorageError::Connection(e.to_string()))?
                    .create_if_missing(true);

                let pool = SqlitePoolOptions::new()
                    .max_connections(1)
                    .connect_with(options)
                    .await
                    .map_err(|e| StorageError::Connection(e.to_string()))?;

                // Lost set races are fine, the pools point at the same file.
                let _ = self.pool.set(pool.clone());
                pool
            }
        };

        sqlx::raw_sql(CURRENT_SCHEMA).execute(&pool).await?;
        info!("Ensured relational schema");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.get().is_some()
    }

    fn pool(&self) -> Result<&Pool<Sqlite>, StorageError> {
        if !self.platform.is_native() {
            return Err(StorageError::Connection(
                "relational engine is unavailable off the native platform".to_string(),
            ));
        }
        self.pool.get().ok_or_else(|| {
            StorageError::NotInitialized(
                "primary store used before ensure_schema".to_string(),
            )
        })
    }

    // --- users ---

    #[instrument(skip(self))]
    pub async fn create_user(&self, username: &str, role: Role) -> Result<User, StorageError> {
        info!("Creating user");
        let pool = self.pool()?;

        let existing = sqlx::query("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        if existing.is_some() {
            return Err(StorageError::Constraint(format!(
                "username '{}' already exists",
                username
            )));
        }

        let res = sqlx::query("INSERT INTO users (username, role) VALUES (?, ?)")
            .bind(username)
            .bind(role.as_str())
            .execute(pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => {
                    StorageError::Constraint(format!("username '{}' already exists", username))
                }
                _ => StorageError::Database(e),
            })?;

        self.get_user(res.last_insert_rowid()).await
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> Result<User, StorageError> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, role, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool()?)
        .await?;

        match row {
            Some(user) => Ok(User::from(user)),
            _ => Err(StorageError::NotFound(format!("user {} not found", id))),
        }
    }

    #[instrument(skip(self))]
    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, StorageError> {
        let row = sqlx::query_as::<_, DbUser>(
            "SELECT id, username, role, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(row.map(User::from))
    }

    // --- child profiles ---

    #[instrument(skip(self, profile))]
    pub async fn create_child_profile(
        &self,
        profile: &NewChildProfile,
    ) -> Result<ChildProfile, StorageError> {
        info!(name = %profile.name, "Creating child profile");
        let res = sqlx::query(
            "INSERT INTO child_profiles (user_id, parent_id, name, age, gender, avatar_index)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(profile.user_id)
        .bind(profile.parent_id)
        .bind(&profile.name)
        .bind(profile.age)
        .bind(profile.gender.as_str())
        .bind(profile.avatar_index)
        .execute(self.pool()?)
        .await?;

        Ok(ChildProfile {
            id: res.last_insert_rowid(),
            user_id: profile.user_id,
            parent_id: profile.parent_id,
            name: profile.name.clone(),
            age: profile.age,
            gender: profile.gender,
            avatar_index: profile.avatar_index,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_child_profile_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<ChildProfile>, StorageError> {
        let row = sqlx::query_as::<_, DbChildProfile>(
            "SELECT * FROM child_profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(row.map(ChildProfile::from))
    }

    #[instrument(skip(self))]
    pub async fn find_child_of_parent(
        &self,
        parent_id: i64,
        name: &str,
    ) -> Result<Option<ChildProfile>, StorageError> {
        let row = sqlx::query_as::<_, DbChildProfile>(
            "SELECT * FROM child_profiles WHERE parent_id = ? AND name = ?",
        )
        .bind(parent_id)
        .bind(name)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(row.map(ChildProfile::from))
    }

    #[instrument(skip(self))]
    pub async fn list_children_of_parent(
        &self,
        parent_id: i64,
    ) -> Result<Vec<ChildProfile>, StorageError> {
        let rows = sqlx::query_as::<_, DbChildProfile>(
            "SELECT * FROM child_profiles WHERE parent_id = ? ORDER BY id",
        )
        .bind(parent_id)
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows.into_iter().map(ChildProfile::from).collect())
    }

    // --- parent / teacher profiles ---

    #[instrument(skip(self))]
    pub async fn create_parent_profile(
        &self,
        user_id: i64,
        name: &str,
        phone: Option<&str>,
    ) -> Result<ParentProfile, StorageError> {
        info!("Creating parent profile");
        let res =
            sqlx::query("INSERT INTO parent_profiles (user_id, name, phone) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(name)
                .bind(phone)
                .execute(self.pool()?)
                .await?;

        Ok(ParentProfile {
            id: res.last_insert_rowid(),
            user_id,
            name: name.to_string(),
            phone: phone.map(str::to_string),
        })
    }

    #[instrument(skip(self))]
    pub async fn find_parent_profile_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<ParentProfile>, StorageError> {
        let row = sqlx::query_as::<_, DbParentProfile>(
            "SELECT * FROM parent_profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(row.map(ParentProfile::from))
    }

    #[instrument(skip(self))]
    pub async fn create_teacher_profile(
        &self,
        user_id: i64,
        name: &str,
        school_name: Option<&str>,
    ) -> Result<TeacherProfile, StorageError> {
        info!("Creating teacher profile");
        let res = sqlx::query(
            "INSERT INTO teacher_profiles (user_id, name, school_name) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(name)
        .bind(school_name)
        .execute(self.pool()?)
        .await?;

        Ok(TeacherProfile {
            id: res.last_insert_rowid(),
            user_id,
            name: name.to_string(),
            school_name: school_name.map(str::to_string),
        })
    }

    #[instrument(skip(self))]
    pub async fn find_teacher_profile_by_user(
        &self,
        user_id: i64,
    ) -> Result<Option<TeacherProfile>, StorageError> {
        let row = sqlx::query_as::<_, DbTeacherProfile>(
            "SELECT * FROM teacher_profiles WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(row.map(TeacherProfile::from))
    }

    // --- schools / students ---

    #[instrument(skip(self, school))]
    pub async fn create_school(&self, school: &NewSchool) -> Result<School, StorageError> {
        info!(name = %school.name, "Creating school");
        let activity_days = serde_json::to_string(&school.activity_days)?;

        let res = sqlx::query(
            "INSERT INTO schools (caretaker_id, name, kind, activity_days) VALUES (?, ?, ?, ?)",
        )
        .bind(school.caretaker_id)
        .bind(&school.name)
        .bind(school.kind.as_str())
        .bind(&activity_days)
        .execute(self.pool()?)
        .await?;

        Ok(School {
            id: res.last_insert_rowid(),
            caretaker_id: school.caretaker_id,
            name: school.name.clone(),
            kind: school.kind,
            activity_days: school.activity_days.clone(),
        })
    }

    #[instrument(skip(self))]
    pub async fn find_school(
        &self,
        caretaker_id: i64,
        name: &str,
    ) -> Result<Option<School>, StorageError> {
        let row = sqlx::query_as::<_, DbSchool>(
            "SELECT * FROM schools WHERE caretaker_id = ? AND name = ?",
        )
        .bind(caretaker_id)
        .bind(name)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(row.map(School::from))
    }

    #[instrument(skip(self))]
    pub async fn list_schools_by_caretaker(
        &self,
        caretaker_id: i64,
    ) -> Result<Vec<School>, StorageError> {
        let rows = sqlx::query_as::<_, DbSchool>(
            "SELECT * FROM schools WHERE caretaker_id = ? ORDER BY id",
        )
        .bind(caretaker_id)
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows.into_iter().map(School::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn create_student(
        &self,
        school_id: i64,
        name: &str,
        age: i64,
        grade: i64,
    ) -> Result<Student, StorageError> {
        info!("Creating student");
        let res =
            sqlx::query("INSERT INTO students (school_id, name, age, grade) VALUES (?, ?, ?, ?)")
                .bind(school_id)
                .bind(name)
                .bind(age)
                .bind(grade)
                .execute(self.pool()?)
                .await?;

        Ok(Student {
            id: res.last_insert_rowid(),
            school_id,
            name: name.to_string(),
            age,
            grade,
        })
    }

    #[instrument(skip(self))]
    pub async fn find_student(
        &self,
        school_id: i64,
        name: &str,
    ) -> Result<Option<Student>, StorageError> {
        let row =
            sqlx::query_as::<_, DbStudent>("SELECT * FROM students WHERE school_id = ? AND name = ?")
                .bind(school_id)
                .bind(name)
                .fetch_optional(self.pool()?)
                .await?;

        Ok(row.map(Student::from))
    }

    #[instrument(skip(self))]
    pub async fn list_students_by_school(
        &self,
        school_id: i64,
    ) -> Result<Vec<Student>, StorageError> {
        let rows =
            sqlx::query_as::<_, DbStudent>("SELECT * FROM students WHERE school_id = ? ORDER BY id")
                .bind(school_id)
                .fetch_all(self.pool()?)
                .await?;

        Ok(rows.into_iter().map(Student::from).collect())
    }

    // --- health records ---

    #[instrument(skip(self, record))]
    pub async fn create_health_record(
        &self,
        record: &NewHealthRecord,
    ) -> Result<HealthRecord, StorageError> {
        info!(student_id = record.student_id, "Creating health record");
        let warning_flags = serde_json::to_string(&record.warning_flags)?;

        let res = sqlx::query(
            "INSERT INTO health_records
             (student_id, date, has_brushed, has_cavity, has_healthy_gums, score, notes,
              warning_flags, needs_referral, referral_notes, resolved)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.student_id)
        .bind(record.date)
        .bind(record.has_brushed)
        .bind(record.has_cavity)
        .bind(record.has_healthy_gums)
        .bind(record.score)
        .bind(&record.notes)
        .bind(&warning_flags)
        .bind(record.needs_referral)
        .bind(&record.referral_notes)
        .bind(record.resolved)
        .execute(self.pool()?)
        .await?;

        Ok(HealthRecord {
            id: res.last_insert_rowid(),
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
        })
    }

    #[instrument(skip(self))]
    pub async fn update_health_record_resolution(
        &self,
        id: i64,
        resolved: bool,
    ) -> Result<bool, StorageError> {
        info!("Updating health record resolution");
        let res = sqlx::query("UPDATE health_records SET resolved = ? WHERE id = ?")
            .bind(resolved)
            .bind(id)
            .execute(self.pool()?)
            .await?;

        Ok(res.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    pub async fn list_health_records_by_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<HealthRecord>, StorageError> {
        let rows = sqlx::query_as::<_, DbHealthRecord>(
            "SELECT * FROM health_records WHERE student_id = ? ORDER BY date, id",
        )
        .bind(student_id)
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows.into_iter().map(HealthRecord::from).collect())
    }

    // --- reminders ---

    /// One reminder per user per kind; a second write to the same slot
    /// replaces time, message and enabled.
    #[instrument(skip(self))]
    pub async fn upsert_reminder(
        &self,
        user_id: i64,
        kind: ReminderKind,
        time: &str,
        message: &str,
        enabled: bool,
    ) -> Result<Reminder, StorageError> {
        info!("Upserting reminder");
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO reminders (user_id, kind, time, message, enabled)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (user_id, kind) DO UPDATE
             SET time = excluded.time, message = excluded.message, enabled = excluded.enabled
             RETURNING id",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(time)
        .bind(message)
        .bind(enabled)
        .fetch_one(self.pool()?)
        .await?;

        Ok(Reminder {
            id,
            user_id,
            kind,
            time: time.to_string(),
            message: message.to_string(),
            enabled,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_reminders_by_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<Reminder>, StorageError> {
        let rows = sqlx::query_as::<_, DbReminder>(
            "SELECT * FROM reminders WHERE user_id = ? ORDER BY kind",
        )
        .bind(user_id)
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows.into_iter().map(Reminder::from).collect())
    }

    // --- brushing records ---

    #[instrument(skip(self))]
    pub async fn create_brushing_record(
        &self,
        child_id: i64,
        date: chrono::NaiveDate,
        time_of_day: TimeOfDay,
        duration_seconds: i64,
        completed: bool,
    ) -> Result<BrushingRecord, StorageError> {
        info!("Creating brushing record");
        let res = sqlx::query(
            "INSERT INTO brushing_records (child_id, date, time_of_day, duration_seconds, completed)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(child_id)
        .bind(date)
        .bind(time_of_day.as_str())
        .bind(duration_seconds)
        .bind(completed)
        .execute(self.pool()?)
        .await?;

        Ok(BrushingRecord {
            id: res.last_insert_rowid(),
            child_id,
            date,
            time_of_day,
            duration_seconds,
            completed,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_brushing_records_by_child(
        &self,
        child_id: i64,
    ) -> Result<Vec<BrushingRecord>, StorageError> {
        let rows = sqlx::query_as::<_, DbBrushingRecord>(
            "SELECT * FROM brushing_records WHERE child_id = ? ORDER BY date, id",
        )
        .bind(child_id)
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows.into_iter().map(BrushingRecord::from).collect())
    }

    // --- achievements ---

    /// Single-statement atomic increment. Counters never go below zero.
    #[instrument(skip(self))]
    pub async fn increment_achievement(
        &self,
        owner_id: i64,
        kind: &str,
        delta: i64,
    ) -> Result<i64, StorageError> {
        let value = sqlx::query_scalar::<_, i64>(
            "INSERT INTO achievements (owner_id, kind, value) VALUES (?, ?, MAX(?, 0))
             ON CONFLICT (owner_id, kind) DO UPDATE SET value = MAX(value + ?, 0)
             RETURNING value",
        )
        .bind(owner_id)
        .bind(kind)
        .bind(delta)
        .bind(delta)
        .fetch_one(self.pool()?)
        .await?;

        Ok(value)
    }

    #[instrument(skip(self))]
    pub async fn get_achievement(
        &self,
        owner_id: i64,
        kind: &str,
    ) -> Result<i64, StorageError> {
        let value = sqlx::query_scalar::<_, i64>(
            "SELECT value FROM achievements WHERE owner_id = ? AND kind = ?",
        )
        .bind(owner_id)
        .bind(kind)
        .fetch_optional(self.pool()?)
        .await?;

        Ok(value.unwrap_or(0))
    }

    #[instrument(skip(self))]
    pub async fn list_achievements_by_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<Achievement>, StorageError> {
        let rows = sqlx::query_as::<_, DbAchievement>(
            "SELECT * FROM achievements WHERE owner_id = ? ORDER BY kind",
        )
        .bind(owner_id)
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows.into_iter().map(Achievement::from).collect())
    }

    /// Explicit reset, the only sanctioned way a counter decreases past zero
    /// deltas.
    #[instrument(skip(self))]
    pub async fn reset_achievements(&self, owner_id: i64) -> Result<(), StorageError> {
        info!("Resetting achievement counters");
        sqlx::query("DELETE FROM achievements WHERE owner_id = ?")
            .bind(owner_id)
            .execute(self.pool()?)
            .await?;

        Ok(())
    }

    // --- surveys ---

    #[instrument(skip(self, response))]
    pub async fn create_survey_response(
        &self,
        response: &NewSurveyResponse,
    ) -> Result<SurveyResponse, StorageError> {
        info!("Creating survey response");
        let submitted_at = response.submitted_at.unwrap_or_else(Utc::now);

        let res = sqlx::query(
            "INSERT INTO survey_responses
             (parent_id, child_name, submitted_at, brushing_frequency, supervises_brushing,
              sweets_frequency, has_seen_dentist, uses_fluoride)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(response.parent_id)
        .bind(&response.child_name)
        .bind(submitted_at.naive_utc())
        .bind(&response.brushing_frequency)
        .bind(response.supervises_brushing)
        .bind(&response.sweets_frequency)
        .bind(response.has_seen_dentist)
        .bind(response.uses_fluoride)
        .execute(self.pool()?)
        .await?;

        Ok(SurveyResponse {
            id: res.last_insert_rowid(),
            parent_id: response.parent_id,
            child_name: response.child_name.clone(),
            submitted_at,
            brushing_frequency: response.brushing_frequency.clone(),
            supervises_brushing: response.supervises_brushing,
            sweets_frequency: response.sweets_frequency.clone(),
            has_seen_dentist: response.has_seen_dentist,
            uses_fluoride: response.uses_fluoride,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_survey_responses_by_parent(
        &self,
        parent_id: i64,
    ) -> Result<Vec<SurveyResponse>, StorageError> {
        let rows = sqlx::query_as::<_, DbSurveyResponse>(
            "SELECT * FROM survey_responses WHERE parent_id = ? ORDER BY submitted_at, id",
        )
        .bind(parent_id)
        .fetch_all(self.pool()?)
        .await?;

        Ok(rows.into_iter().map(SurveyResponse::from).collect())
    }
}
