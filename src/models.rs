//! Wellness Data Structures
//!
//! Defines the three synchronized collections (mood entries, goals, derived
//! stats), the wire types matching the remote HTTP contract, and the
//! per-session sync status.
//!
//! Records carry a `synced` flag: `true` means the local copy matches a
//! confirmed remote write. Mood entries created offline additionally carry a
//! temporary `local_id` until the server assigns a canonical identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A single mood observation.
///
/// Invariant: an entry has either a pending `local_id` (unsynced, optimistic)
/// or `synced == true` with a canonical identifier, never both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodEntry {
    /// Canonical server id once synced, otherwise the temporary local id
    pub id: String,
    /// Observation timestamp
    pub date: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Mood score (1-5)
    pub mood_score: u8,
    /// Optional energy level (1-5)
    pub energy: Option<u8>,
    /// Optional stress level (1-5)
    pub stress: Option<u8>,
    /// Optional free-text note
    pub notes: Option<String>,
    /// Optional tags
    pub tags: Option<Vec<String>>,
    /// Whether the local copy matches a confirmed remote write
    pub synced: bool,
    /// Temporary client-generated id, present only while unsynced
    pub local_id: Option<String>,
}

impl MoodEntry {
    /// Build an unsynced optimistic entry from a create payload.
    pub fn optimistic(payload: &NewMoodEntry) -> Self {
        let local_id = new_local_id();
        let now = Utc::now();
        Self {
            id: local_id.clone(),
            date: now,
            created_at: now,
            mood_score: payload.mood_score,
            energy: payload.energy,
            stress: payload.stress,
            notes: payload.notes.clone(),
            tags: payload.tags.clone(),
            synced: false,
            local_id: Some(local_id),
        }
    }

    /// Build a synced entry from the server's canonical record.
    pub fn from_remote(remote: RemoteMoodEntry) -> Self {
        Self {
            id: remote.id,
            date: remote.created_at,
            created_at: remote.created_at,
            mood_score: remote.mood_score,
            energy: remote.energy,
            stress: remote.stress,
            notes: remote.notes,
            tags: remote.tags,
            synced: true,
            local_id: None,
        }
    }
}

/// Generate a temporary identifier for a record not yet assigned a canonical
/// id by the remote service.
pub fn new_local_id() -> String {
    format!("local_{}", Uuid::new_v4())
}

/// Mood entry as returned by `GET /wellness/mood/history` and
/// `POST /wellness/mood`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMoodEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub mood_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Create payload for `POST /wellness/mood`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewMoodEntry {
    pub mood_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NewMoodEntry {
    /// Create a payload with only a mood score
    pub fn with_score(mood_score: u8) -> Self {
        Self {
            mood_score,
            energy: None,
            stress: None,
            notes: None,
            tags: None,
        }
    }

    /// Check score ranges (mood, energy and stress are all 1-5)
    pub fn is_valid(&self) -> bool {
        let in_range = |v: u8| (1..=5).contains(&v);
        in_range(self.mood_score)
            && self.energy.map_or(true, in_range)
            && self.stress.map_or(true, in_range)
    }
}

/// Goal categories (fixed enumeration)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GoalCategory {
    Mood,
    Sleep,
    Exercise,
    Meditation,
    Other,
}

/// A trackable wellness goal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellnessGoal {
    pub id: String,
    pub name: String,
    pub current: f64,
    pub target: f64,
    pub unit: String,
    pub category: GoalCategory,
    /// False while an update has not been confirmed by the server
    pub synced: bool,
}

impl WellnessGoal {
    /// Build a synced goal from the server's canonical record.
    pub fn from_remote(remote: RemoteGoal) -> Self {
        Self {
            id: remote.id,
            name: remote.name,
            current: remote.current,
            target: remote.target,
            unit: remote.unit,
            category: remote.category,
            synced: true,
        }
    }

    /// Apply a partial update in place. Does not touch the `synced` flag.
    pub fn apply_update(&mut self, update: &GoalUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(current) = update.current {
            self.current = current;
        }
        if let Some(target) = update.target {
            self.target = target;
        }
        if let Some(unit) = &update.unit {
            self.unit = unit.clone();
        }
        if let Some(category) = update.category {
            self.category = category;
        }
    }
}

/// Goal as returned by `GET /wellness/goals` and `PUT /wellness/goals/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteGoal {
    pub id: String,
    pub name: String,
    pub current: f64,
    pub target: f64,
    pub unit: String,
    pub category: GoalCategory,
}

/// Partial-update payload for `PUT /wellness/goals/{goalId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GoalUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<GoalCategory>,
}

impl GoalUpdate {
    /// Update only the current value
    pub fn current(value: f64) -> Self {
        Self {
            current: Some(value),
            ..Self::default()
        }
    }

    /// Capture every field of a goal, for resubmitting an unsynced record.
    pub fn from_goal(goal: &WellnessGoal) -> Self {
        Self {
            name: Some(goal.name.clone()),
            current: Some(goal.current),
            target: Some(goal.target),
            unit: Some(goal.unit.clone()),
            category: Some(goal.category),
        }
    }
}

/// Aggregated insights as returned by `GET /wellness/insights`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteInsights {
    #[serde(default)]
    pub average_mood: f64,
    #[serde(default)]
    pub average_stress: f64,
    #[serde(default)]
    pub mood_entries_count: u64,
}

/// Weekly averages over mood observations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeeklyAverage {
    pub mood: f64,
    pub energy: f64,
    pub stress: f64,
}

/// Derived statistics. Never directly mutated by the user; recomputed on
/// every successful full sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WellnessStats {
    pub overall_score: f64,
    /// Consecutive calendar days, walking backward from today, with at least
    /// one mood entry each day
    pub day_streak: u32,
    pub total_activities: u64,
    pub weekly_average: WeeklyAverage,
    pub last_calculated: DateTime<Utc>,
    /// True only when sourced from a successful remote fetch
    pub synced: bool,
}

/// Process-wide sync status, one instance per authenticated session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncStatus {
    pub is_online: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub sync_in_progress: bool,
    /// Count of locally-held records whose `synced` flag is false
    pub pending_changes: usize,
    pub errors: Vec<String>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            is_online: false,
            last_sync: None,
            sync_in_progress: false,
            pending_changes: 0,
            errors: Vec::new(),
        }
    }
}

/// Stress observation, mirrored read-only from `GET /wellness/stress/history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StressEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Sleep observation, mirrored read-only from `GET /wellness/sleep/history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SleepEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    pub hours: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

/// Social activity, mirrored read-only from `GET /wellness/social/history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SocialEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub activity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
}

/// In-memory view of the three synchronized collections.
///
/// Collections are keyed by record identifier so that swapping a local
/// optimistic record for its canonical server version is a single
/// remove-and-insert rather than an array scan.
#[derive(Debug, Clone, Default)]
pub struct WellnessStore {
    pub mood_entries: HashMap<String, MoodEntry>,
    pub goals: HashMap<String, WellnessGoal>,
    pub stats: Option<WellnessStats>,
}

impl WellnessStore {
    /// Mood entries ordered newest-first by creation timestamp.
    pub fn mood_entries_sorted(&self) -> Vec<MoodEntry> {
        let mut entries: Vec<MoodEntry> = self.mood_entries.values().cloned().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }

    /// Goals ordered by name.
    pub fn goals_sorted(&self) -> Vec<WellnessGoal> {
        let mut goals: Vec<WellnessGoal> = self.goals.values().cloned().collect();
        goals.sort_by(|a, b| a.name.cmp(&b.name));
        goals
    }

    /// Unsynced mood entries + unsynced goals.
    pub fn pending_changes(&self) -> usize {
        self.mood_entries.values().filter(|e| !e.synced).count()
            + self.goals.values().filter(|g| !g.synced).count()
    }

    pub fn unsynced_mood_entries(&self) -> Vec<MoodEntry> {
        self.mood_entries
            .values()
            .filter(|e| !e.synced)
            .cloned()
            .collect()
    }

    pub fn unsynced_goals(&self) -> Vec<WellnessGoal> {
        self.goals.values().filter(|g| !g.synced).cloned().collect()
    }

    /// Replace a local optimistic entry with its canonical server version.
    pub fn confirm_mood_entry(&mut self, local_id: &str, canonical: MoodEntry) {
        self.mood_entries.remove(local_id);
        self.mood_entries.insert(canonical.id.clone(), canonical);
    }

    /// Wholesale replacement of all three collections with canonical server
    /// data. Unsynced local records are carried over so a full read sync
    /// never drops a pending optimistic mutation.
    pub fn replace_all(
        &mut self,
        entries: Vec<MoodEntry>,
        goals: Vec<WellnessGoal>,
        stats: WellnessStats,
    ) {
        let pending_entries = self.unsynced_mood_entries();
        let pending_goals = self.unsynced_goals();

        self.mood_entries = entries.into_iter().map(|e| (e.id.clone(), e)).collect();
        for entry in pending_entries {
            self.mood_entries.insert(entry.id.clone(), entry);
        }

        self.goals = goals.into_iter().map(|g| (g.id.clone(), g)).collect();
        for goal in pending_goals {
            self.goals.insert(goal.id.clone(), goal);
        }

        self.stats = Some(stats);
    }
}
