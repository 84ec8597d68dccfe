use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Child,
    Parent,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Child => "child",
            Role::Parent => "parent",
            Role::Teacher => "teacher",
        }
    }

    pub fn from_str(s: &str) -> Option<Role> {
        match s {
            "child" => Some(Role::Child),
            "parent" => Some(Role::Parent),
            "teacher" => Some(Role::Teacher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Girl,
    Boy,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Girl => "girl",
            Gender::Boy => "boy",
        }
    }

    pub fn from_str(s: &str) -> Option<Gender> {
        match s {
            "girl" => Some(Gender::Girl),
            "boy" => Some(Gender::Boy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolKind {
    #[default]
    Girls,
    Boys,
}

impl SchoolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolKind::Girls => "girls",
            SchoolKind::Boys => "boys",
        }
    }

    pub fn from_str(s: &str) -> Option<SchoolKind> {
        match s {
            "girls" => Some(SchoolKind::Girls),
            "boys" => Some(SchoolKind::Boys),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeOfDay {
    #[default]
    Morning,
    Evening,
}

impl TimeOfDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Evening => "evening",
        }
    }

    pub fn from_str(s: &str) -> Option<TimeOfDay> {
        match s {
            "morning" => Some(TimeOfDay::Morning),
            "evening" => Some(TimeOfDay::Evening),
            _ => None,
        }
    }
}

/// Reminder slot. At most one reminder per user per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReminderKind {
    #[default]
    BrushMorning,
    BrushEvening,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::BrushMorning => "brushMorning",
            ReminderKind::BrushEvening => "brushEvening",
        }
    }

    pub fn from_str(s: &str) -> Option<ReminderKind> {
        match s {
            "brushMorning" => Some(ReminderKind::BrushMorning),
            "brushEvening" => Some(ReminderKind::BrushEvening),
            _ => None,
        }
    }
}

/// Named warning booleans on a health record. Stored as a JSON column so new
/// flags can be added without a schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarningFlags {
    pub severe_pain: bool,
    pub bleeding_gums: bool,
    pub swelling: bool,
    pub broken_tooth: bool,
}

impl WarningFlags {
    pub fn any(&self) -> bool {
        self.severe_pain || self.bleeding_gums || self.swelling || self.broken_tooth
    }
}

/// Zero-padded "HH:MM" reminder time.
pub fn format_alarm_time(hour: u32, minute: u32) -> String {
    format!("{:02}:{:02}", hour, minute)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Pre-migration entries in the shared `app_users` blob carry no id; they
    /// deserialize as 0 until the fallback store rewrites the collection.
    #[serde(default)]
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        Self {
            id: user.id.unwrap_or_default(),
            username: user.username.unwrap_or_default(),
            role: Role::from_str(&user.role.unwrap_or_default()).unwrap_or(Role::Child),
            created_at: user
                .created_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildProfile {
    pub id: i64,
    /// Owning account for self-managed children; absent for roster entries
    /// that only exist under a parent account.
    pub user_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub name: String,
    pub age: i64,
    pub gender: Gender,
    pub avatar_index: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbChildProfile {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub avatar_index: Option<i64>,
}

impl From<DbChildProfile> for ChildProfile {
    fn from(row: DbChildProfile) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            user_id: row.user_id,
            parent_id: row.parent_id,
            name: row.name.unwrap_or_default(),
            age: row.age.unwrap_or_default(),
            gender: Gender::from_str(&row.gender.unwrap_or_default()).unwrap_or_default(),
            avatar_index: row.avatar_index.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewChildProfile {
    pub user_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub name: String,
    pub age: i64,
    pub gender: Gender,
    pub avatar_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentProfile {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbParentProfile {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl From<DbParentProfile> for ParentProfile {
    fn from(row: DbParentProfile) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            user_id: row.user_id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            phone: row.phone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub school_name: Option<String>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbTeacherProfile {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub name: Option<String>,
    pub school_name: Option<String>,
}

impl From<DbTeacherProfile> for TeacherProfile {
    fn from(row: DbTeacherProfile) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            user_id: row.user_id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            school_name: row.school_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: i64,
    pub caretaker_id: i64,
    pub name: String,
    pub kind: SchoolKind,
    /// Ordered weekday tokens ("sat", "sun", ...). JSON-encoded in the
    /// relational column.
    pub activity_days: Vec<String>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbSchool {
    pub id: Option<i64>,
    pub caretaker_id: Option<i64>,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub activity_days: Option<String>,
}

impl From<DbSchool> for School {
    fn from(row: DbSchool) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            caretaker_id: row.caretaker_id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            kind: SchoolKind::from_str(&row.kind.unwrap_or_default()).unwrap_or_default(),
            activity_days: row
                .activity_days
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSchool {
    pub caretaker_id: i64,
    pub name: String,
    pub kind: SchoolKind,
    pub activity_days: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub school_id: i64,
    pub name: String,
    pub age: i64,
    pub grade: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbStudent {
    pub id: Option<i64>,
    pub school_id: Option<i64>,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub grade: Option<i64>,
}

impl From<DbStudent> for Student {
    fn from(row: DbStudent) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            school_id: row.school_id.unwrap_or_default(),
            name: row.name.unwrap_or_default(),
            age: row.age.unwrap_or_default(),
            grade: row.grade.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: i64,
    pub student_id: i64,
    pub date: NaiveDate,
    pub has_brushed: bool,
    pub has_cavity: bool,
    pub has_healthy_gums: bool,
    pub score: i64,
    pub notes: String,
    pub warning_flags: WarningFlags,
    pub needs_referral: bool,
    pub referral_notes: String,
    pub resolved: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbHealthRecord {
    pub id: Option<i64>,
    pub student_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub has_brushed: Option<bool>,
    pub has_cavity: Option<bool>,
    pub has_healthy_gums: Option<bool>,
    pub score: Option<i64>,
    pub notes: Option<String>,
    pub warning_flags: Option<String>,
    pub needs_referral: Option<bool>,
    pub referral_notes: Option<String>,
    pub resolved: Option<bool>,
}

impl From<DbHealthRecord> for HealthRecord {
    fn from(row: DbHealthRecord) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            student_id: row.student_id.unwrap_or_default(),
            date: row.date.unwrap_or_default(),
            has_brushed: row.has_brushed.unwrap_or_default(),
            has_cavity: row.has_cavity.unwrap_or_default(),
            has_healthy_gums: row.has_healthy_gums.unwrap_or(true),
            score: row.score.unwrap_or(5),
            notes: row.notes.unwrap_or_default(),
            warning_flags: row
                .warning_flags
                .as_deref()
                .and_then(|raw| serde_json::from_str(raw).ok())
                .unwrap_or_default(),
            needs_referral: row.needs_referral.unwrap_or_default(),
            referral_notes: row.referral_notes.unwrap_or_default(),
            resolved: row.resolved.unwrap_or_default(),
        }
    }
}

/// Health record as submitted by a check-in flow or the migrator.
///
/// `needs_referral` is final here: check-in flows derive it (explicit flag OR
/// any warning flag) before constructing this value, and the migrator carries
/// the stored legacy value through untouched.
#[derive(Debug, Clone, Default)]
pub struct NewHealthRecord {
    pub student_id: i64,
    pub date: NaiveDate,
    pub has_brushed: bool,
    pub has_cavity: bool,
    pub has_healthy_gums: bool,
    pub score: i64,
    pub notes: String,
    pub warning_flags: WarningFlags,
    pub needs_referral: bool,
    pub referral_notes: String,
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub user_id: i64,
    pub kind: ReminderKind,
    pub time: String,
    pub message: String,
    pub enabled: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbReminder {
    pub id: Option<i64>,
    pub user_id: Option<i64>,
    pub kind: Option<String>,
    pub time: Option<String>,
    pub message: Option<String>,
    pub enabled: Option<bool>,
}

impl From<DbReminder> for Reminder {
    fn from(row: DbReminder) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            user_id: row.user_id.unwrap_or_default(),
            kind: ReminderKind::from_str(&row.kind.unwrap_or_default()).unwrap_or_default(),
            time: row.time.unwrap_or_default(),
            message: row.message.unwrap_or_default(),
            enabled: row.enabled.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushingRecord {
    pub id: i64,
    pub child_id: i64,
    pub date: NaiveDate,
    pub time_of_day: TimeOfDay,
    pub duration_seconds: i64,
    pub completed: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbBrushingRecord {
    pub id: Option<i64>,
    pub child_id: Option<i64>,
    pub date: Option<NaiveDate>,
    pub time_of_day: Option<String>,
    pub duration_seconds: Option<i64>,
    pub completed: Option<bool>,
}

impl From<DbBrushingRecord> for BrushingRecord {
    fn from(row: DbBrushingRecord) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            child_id: row.child_id.unwrap_or_default(),
            date: row.date.unwrap_or_default(),
            time_of_day: TimeOfDay::from_str(&row.time_of_day.unwrap_or_default())
                .unwrap_or_default(),
            duration_seconds: row.duration_seconds.unwrap_or_default(),
            completed: row.completed.unwrap_or_default(),
        }
    }
}

/// Durable counter keyed by `(owner_id, kind)`. Owners are user ids for
/// self-managed children and child-profile ids for parent-managed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub owner_id: i64,
    pub kind: String,
    pub value: i64,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbAchievement {
    pub owner_id: Option<i64>,
    pub kind: Option<String>,
    pub value: Option<i64>,
}

impl From<DbAchievement> for Achievement {
    fn from(row: DbAchievement) -> Self {
        Self {
            owner_id: row.owner_id.unwrap_or_default(),
            kind: row.kind.unwrap_or_default(),
            value: row.value.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub id: i64,
    pub parent_id: i64,
    /// Free text. Historical surveys predate child profiles, so this is not
    /// a foreign key and may not resolve to any ChildProfile.
    pub child_name: String,
    pub submitted_at: DateTime<Utc>,
    pub brushing_frequency: String,
    pub supervises_brushing: bool,
    pub sweets_frequency: String,
    pub has_seen_dentist: bool,
    pub uses_fluoride: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbSurveyResponse {
    pub id: Option<i64>,
    pub parent_id: Option<i64>,
    pub child_name: Option<String>,
    pub submitted_at: Option<NaiveDateTime>,
    pub brushing_frequency: Option<String>,
    pub supervises_brushing: Option<bool>,
    pub sweets_frequency: Option<String>,
    pub has_seen_dentist: Option<bool>,
    pub uses_fluoride: Option<bool>,
}

impl From<DbSurveyResponse> for SurveyResponse {
    fn from(row: DbSurveyResponse) -> Self {
        Self {
            id: row.id.unwrap_or_default(),
            parent_id: row.parent_id.unwrap_or_default(),
            child_name: row.child_name.unwrap_or_default(),
            submitted_at: row
                .submitted_at
                .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                .unwrap_or_else(Utc::now),
            brushing_frequency: row.brushing_frequency.unwrap_or_default(),
            supervises_brushing: row.supervises_brushing.unwrap_or_default(),
            sweets_frequency: row.sweets_frequency.unwrap_or_default(),
            has_seen_dentist: row.has_seen_dentist.unwrap_or_default(),
            uses_fluoride: row.uses_fluoride.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSurveyResponse {
    pub parent_id: i64,
    pub child_name: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub brushing_frequency: String,
    pub supervises_brushing: bool,
    pub sweets_frequency: String,
    pub has_seen_dentist: bool,
    pub uses_fluoride: bool,
}
