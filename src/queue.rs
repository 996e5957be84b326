//! Optimistic Mutation Queue
//!
//! Records locally-originated mutations (new mood entry, goal update)
//! immediately, tagged unsynced, before any network round-trip completes.
//! Both operations are infallible and return as soon as the in-memory store
//! and cache reflect the change, so callers can show the new value without
//! waiting on the network.
//!
//! Each mutation also publishes a [`MutationEvent`]; the sync engine
//! subscribes to these instead of the write path scheduling its own delayed
//! resyncs.

use crate::cache::{CachedSnapshot, LocalCache};
use crate::models::{GoalUpdate, MoodEntry, NewMoodEntry, WellnessGoal, WellnessStore};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Events published by the mutation path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationEvent {
    /// A mood entry was recorded locally and awaits remote confirmation
    MoodEntryQueued { local_id: String },
    /// A goal update was applied locally and awaits remote confirmation
    GoalUpdateQueued { goal_id: String },
    /// The server confirmed a mood entry; a stats resync is desirable
    MoodEntryConfirmed { id: String },
    /// The server confirmed a goal update
    GoalConfirmed { id: String },
}

/// Records optimistic mutations into the shared store and cache.
///
/// Clones share the same store, cache and event channel.
#[derive(Debug, Clone)]
pub struct OptimisticMutationQueue {
    user_id: String,
    store: Arc<RwLock<WellnessStore>>,
    cache: Arc<LocalCache>,
    events: broadcast::Sender<MutationEvent>,
}

impl OptimisticMutationQueue {
    pub fn new(
        user_id: impl Into<String>,
        store: Arc<RwLock<WellnessStore>>,
        cache: Arc<LocalCache>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            user_id: user_id.into(),
            store,
            cache,
            events,
        }
    }

    /// Record a new mood entry optimistically.
    ///
    /// Assigns a temporary local identifier, marks the entry unsynced,
    /// inserts it into the shared store and triggers a cache save. Never
    /// fails.
    pub async fn enqueue_mood_entry(&self, payload: &NewMoodEntry) -> MoodEntry {
        let entry = MoodEntry::optimistic(payload);
        let local_id = entry.id.clone();

        {
            let mut store = self.store.write().await;
            store.mood_entries.insert(entry.id.clone(), entry.clone());
        }
        self.persist().await;

        tracing::debug!(local_id, "queued optimistic mood entry");
        let _ = self.events.send(MutationEvent::MoodEntryQueued { local_id });
        entry
    }

    /// Apply a partial goal update optimistically.
    ///
    /// The update is applied in place, the goal is marked unsynced and a
    /// cache save is triggered. Returns the updated goal, or `None` when no
    /// goal with the given id exists.
    pub async fn enqueue_goal_update(
        &self,
        goal_id: &str,
        update: &GoalUpdate,
    ) -> Option<WellnessGoal> {
        let updated = {
            let mut store = self.store.write().await;
            let goal = store.goals.get_mut(goal_id)?;
            goal.apply_update(update);
            goal.synced = false;
            goal.clone()
        };
        self.persist().await;

        tracing::debug!(goal_id, "queued optimistic goal update");
        let _ = self.events.send(MutationEvent::GoalUpdateQueued {
            goal_id: goal_id.to_string(),
        });
        Some(updated)
    }

    /// Subscribe to mutation events
    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.events.subscribe()
    }

    /// Publish an event on the mutation channel. Used by the sync engine to
    /// announce remote confirmations.
    pub(crate) fn emit(&self, event: MutationEvent) {
        let _ = self.events.send(event);
    }

    /// Persist the current store snapshot. Best-effort; the last-sync
    /// timestamp is left untouched (it belongs to the full-sync path).
    pub(crate) async fn persist(&self) {
        let snapshot = {
            let store = self.store.read().await;
            CachedSnapshot {
                mood_entries: store.mood_entries_sorted(),
                goals: store.goals_sorted(),
                stats: store.stats.clone(),
                last_sync: None,
            }
        };
        self.cache.save(&self.user_id, &snapshot).await;
    }
}
