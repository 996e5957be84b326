//! Wellness Data Facade
//!
//! Consumer-facing surface over the sync engine:
//!
//! - Read snapshots translated to the legacy shape (mood entries carry both
//!   `mood` and `mood_score`, kept in sync)
//! - Mutations gated by the user's tracking preferences and delegated to the
//!   engine
//! - Read-only mirror collections (stress, sleep, social) fetched wholesale
//!   from the remote service, with no optimistic writes or offline queuing
//!
//! The facade keeps one user-visible error string; detailed sync errors live
//! in [`SyncStatus`](crate::models::SyncStatus).

use crate::client::SyncClient;
use crate::engine::SyncEngine;
use crate::error::SyncError;
use crate::models::{
    GoalUpdate, MoodEntry, NewMoodEntry, SleepEntry, SocialEntry, StressEntry, SyncStatus,
    WellnessGoal, WellnessStats,
};
use std::sync::{Arc, RwLock as StdRwLock};
use tokio::sync::RwLock;

/// Per-user tracking preferences. Mutations against a disabled category are
/// refused with a precondition error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellnessPreferences {
    pub track_mood: bool,
    pub track_stress: bool,
    pub allow_insights: bool,
}

impl Default for WellnessPreferences {
    fn default() -> Self {
        Self {
            track_mood: true,
            track_stress: true,
            allow_insights: true,
        }
    }
}

/// Legacy-compatible read shape for a mood entry. `mood` and `mood_score`
/// always hold the same value; older consumers read the former, newer ones
/// the latter.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodEntryView {
    pub id: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub mood: u8,
    pub mood_score: u8,
    pub energy: Option<u8>,
    pub stress: Option<u8>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    pub synced: bool,
}

impl From<MoodEntry> for MoodEntryView {
    fn from(entry: MoodEntry) -> Self {
        Self {
            id: entry.id,
            date: entry.date,
            mood: entry.mood_score,
            mood_score: entry.mood_score,
            energy: entry.energy,
            stress: entry.stress,
            notes: entry.notes,
            tags: entry.tags,
            synced: entry.synced,
        }
    }
}

#[derive(Debug, Default)]
struct MirrorCollections {
    stress: Vec<StressEntry>,
    sleep: Vec<SleepEntry>,
    social: Vec<SocialEntry>,
}

/// Read/write surface consumed by UI components.
///
/// Clones share the underlying engine and mirror state.
#[derive(Debug)]
pub struct WellnessDataFacade<C: SyncClient> {
    engine: SyncEngine<C>,
    preferences: Arc<StdRwLock<WellnessPreferences>>,
    mirrors: Arc<RwLock<MirrorCollections>>,
    last_error: Arc<StdRwLock<Option<String>>>,
}

impl<C: SyncClient> Clone for WellnessDataFacade<C> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            preferences: Arc::clone(&self.preferences),
            mirrors: Arc::clone(&self.mirrors),
            last_error: Arc::clone(&self.last_error),
        }
    }
}

impl<C: SyncClient> WellnessDataFacade<C> {
    pub fn new(engine: SyncEngine<C>) -> Self {
        Self::with_preferences(engine, WellnessPreferences::default())
    }

    pub fn with_preferences(engine: SyncEngine<C>, preferences: WellnessPreferences) -> Self {
        Self {
            engine,
            preferences: Arc::new(StdRwLock::new(preferences)),
            mirrors: Arc::new(RwLock::new(MirrorCollections::default())),
            last_error: Arc::new(StdRwLock::new(None)),
        }
    }

    /// The engine behind this facade, for lifecycle calls (`start`,
    /// `shutdown`, `reset`).
    pub fn engine(&self) -> &SyncEngine<C> {
        &self.engine
    }

    pub fn preferences(&self) -> WellnessPreferences {
        *self.preferences.read().expect("preferences lock poisoned")
    }

    pub fn set_preferences(&self, preferences: WellnessPreferences) {
        *self.preferences.write().expect("preferences lock poisoned") = preferences;
    }

    /// Whether the user both tracks mood and has at least one entry. UI
    /// layers use this to switch between empty and populated states.
    pub async fn has_data(&self) -> bool {
        if !self.preferences().track_mood {
            return false;
        }
        !self.engine.mood_entries().await.is_empty()
    }

    /// Mood entries in the legacy shape, newest first, optimistic records
    /// included.
    pub async fn mood_entries(&self) -> Vec<MoodEntryView> {
        self.engine
            .mood_entries()
            .await
            .into_iter()
            .map(MoodEntryView::from)
            .collect()
    }

    pub async fn goals(&self) -> Vec<WellnessGoal> {
        self.engine.goals().await
    }

    pub async fn stats(&self) -> Option<WellnessStats> {
        self.engine.stats().await
    }

    pub async fn sync_status(&self) -> SyncStatus {
        self.engine.sync_status().await
    }

    /// Record a mood entry. Refused without network traffic when mood
    /// tracking is disabled or the score is out of range.
    pub async fn add_mood_entry(&self, payload: NewMoodEntry) -> Result<MoodEntryView, SyncError> {
        if !self.preferences().track_mood {
            return Err(self.refuse("Mood tracking is disabled"));
        }
        if !payload.is_valid() {
            return Err(self.refuse("Mood scores must be between 1 and 5"));
        }

        match self.engine.add_mood_entry(payload).await {
            Ok(entry) => Ok(MoodEntryView::from(entry)),
            Err(e) => {
                self.set_error("Failed to save mood entry");
                Err(e)
            }
        }
    }

    /// Apply a partial goal update.
    pub async fn update_wellness_goal(
        &self,
        goal_id: &str,
        update: GoalUpdate,
    ) -> Result<WellnessGoal, SyncError> {
        match self.engine.update_wellness_goal(goal_id, update).await {
            Ok(goal) => Ok(goal),
            Err(e) => {
                self.set_error("Failed to update goal");
                Err(e)
            }
        }
    }

    /// Trigger a full sync now.
    pub async fn refresh_data(&self) -> Result<(), SyncError> {
        self.engine.sync_data().await.map_err(|e| {
            if !e.is_operational() {
                self.set_error("Failed to sync wellness data");
            }
            e
        })
    }

    pub async fn force_sync_all(&self) -> Result<(), SyncError> {
        self.engine.force_sync_all().await
    }

    /// Stress entries mirror, as of the last refresh.
    pub async fn stress_entries(&self) -> Vec<StressEntry> {
        self.mirrors.read().await.stress.clone()
    }

    /// Sleep entries mirror, as of the last refresh.
    pub async fn sleep_entries(&self) -> Vec<SleepEntry> {
        self.mirrors.read().await.sleep.clone()
    }

    /// Social entries mirror, as of the last refresh.
    pub async fn social_entries(&self) -> Vec<SocialEntry> {
        self.mirrors.read().await.social.clone()
    }

    /// Refetch the stress mirror. Refused when stress tracking is disabled.
    pub async fn refresh_stress(&self) -> Result<(), SyncError> {
        if !self.preferences().track_stress {
            return Err(self.refuse("Stress tracking is disabled"));
        }
        let token = self.mirror_token()?;
        let entries = self.engine.client().fetch_stress_history(&token).await?;
        self.mirrors.write().await.stress = entries;
        Ok(())
    }

    /// Refetch the sleep mirror.
    pub async fn refresh_sleep(&self) -> Result<(), SyncError> {
        let token = self.mirror_token()?;
        let entries = self.engine.client().fetch_sleep_history(&token).await?;
        self.mirrors.write().await.sleep = entries;
        Ok(())
    }

    /// Refetch the social mirror.
    pub async fn refresh_social(&self) -> Result<(), SyncError> {
        let token = self.mirror_token()?;
        let entries = self.engine.client().fetch_social_history(&token).await?;
        self.mirrors.write().await.social = entries;
        Ok(())
    }

    /// Refresh every mirror collection, continuing past individual
    /// failures. Returns the first error encountered, if any.
    pub async fn refresh_all(&self) -> Result<(), SyncError> {
        let mut first_error = None;
        let track_stress = self.preferences().track_stress;

        if track_stress {
            if let Err(e) = self.refresh_stress().await {
                tracing::warn!(error = %e, "stress mirror refresh failed");
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.refresh_sleep().await {
            tracing::warn!(error = %e, "sleep mirror refresh failed");
            first_error.get_or_insert(e);
        }
        if let Err(e) = self.refresh_social().await {
            tracing::warn!(error = %e, "social mirror refresh failed");
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Drop the mirror collections, for account switches.
    pub async fn clear_mirrors(&self) {
        *self.mirrors.write().await = MirrorCollections::default();
    }

    /// The most recent user-visible error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().expect("error lock poisoned").clone()
    }

    pub fn clear_error(&self) {
        *self.last_error.write().expect("error lock poisoned") = None;
    }

    fn mirror_token(&self) -> Result<String, SyncError> {
        self.engine
            .config()
            .bearer_token()
            .ok_or_else(|| SyncError::precondition("No authentication token found"))
    }

    fn refuse(&self, message: &str) -> SyncError {
        self.set_error(message);
        SyncError::precondition(message)
    }

    fn set_error(&self, message: &str) {
        *self.last_error.write().expect("error lock poisoned") = Some(message.to_string());
    }
}
