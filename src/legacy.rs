//! Legacy flat-record shapes and the parse seam the migrators read through.
//!
//! Years of historical data were written as ad-hoc JSON blobs under
//! well-known string keys, one blob per role feature. Each shape is modelled
//! here as an explicit struct so malformed history fails loudly at this one
//! boundary instead of leaking nulls into the transform logic.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;
use crate::fallback::kv::KeyValueStore;

/// Key space of the legacy blobs the migrators consume. These names are an
/// on-disk contract with years of shipped builds; never rename them.
pub mod keys {
    /// Generic account list: `[{"username": .., "role": ..}, ..]`.
    pub const APP_USERS: &str = "app_users";

    pub const CHILD_PROFILE: &str = "childProfile";
    pub const CHILD_ACHIEVEMENTS: &str = "childAchievements";
    pub const CHILD_ALARMS: &str = "childAlarms";
    pub const CHILD_GAME_SCORES: &str = "childGameScores";

    pub const PARENT_CHILDREN: &str = "parentChildren";
    pub const PARENT_ALARMS: &str = "parentAlarms";
    pub const PARENT_SURVEYS: &str = "parentSurveys";

    pub const CARETAKER_SCHOOLS: &str = "caretakerSchools";
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAccount {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyChildProfile {
    pub name: String,
    #[serde(default)]
    pub age: i64,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub avatar_index: i64,
}

/// `{"stars": 3, "diamonds": 1, ...}` — counter name to value.
pub type LegacyAchievements = BTreeMap<String, i64>;

/// Game high scores, also migrated into achievement counters.
pub type LegacyGameScores = BTreeMap<String, i64>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAlarm {
    pub hour: u32,
    pub minute: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyAlarms {
    pub morning: Option<LegacyAlarm>,
    pub evening: Option<LegacyAlarm>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyParentChild {
    pub name: String,
    #[serde(default)]
    pub age: i64,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub avatar_index: i64,
    #[serde(default)]
    pub brushing_records: Vec<LegacyBrushingRecord>,
    #[serde(default)]
    pub achievements: LegacyAchievements,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyBrushingRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub time_of_day: String,
    #[serde(default)]
    pub duration_seconds: i64,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySurveyResponse {
    #[serde(default)]
    pub child_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub brushing_frequency: String,
    #[serde(default)]
    pub supervises_brushing: bool,
    #[serde(default)]
    pub sweets_frequency: String,
    #[serde(default)]
    pub has_seen_dentist: bool,
    #[serde(default)]
    pub uses_fluoride: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySchool {
    pub name: String,
    #[serde(default, alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub activity_days: Vec<String>,
    #[serde(default)]
    pub students: Vec<LegacyStudent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStudent {
    pub name: String,
    #[serde(default)]
    pub age: i64,
    #[serde(default)]
    pub grade: i64,
    #[serde(default)]
    pub health_records: Vec<LegacyHealthRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyHealthRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub has_brushed: bool,
    #[serde(default)]
    pub has_cavity: bool,
    /// Historically only written when false.
    #[serde(default = "default_true")]
    pub has_healthy_gums: bool,
    #[serde(default = "default_score")]
    pub score: i64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub warning_flags: crate::models::WarningFlags,
    /// Migrated as stored; never recomputed from the warning flags.
    #[serde(default)]
    pub needs_referral: bool,
    #[serde(default)]
    pub referral_notes: String,
    #[serde(default)]
    pub resolved: bool,
}

fn default_true() -> bool {
    true
}

fn default_score() -> i64 {
    5
}

/// Read and parse one legacy blob. An absent key is normal (the feature was
/// never used) and comes back as `None`; a present-but-malformed blob is an
/// error the caller must treat as a migration abort.
pub async fn load<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = kv.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Malformed legacy record");
            Err(StorageError::Serialization(e))
        }
    }
}
