//! Sync Engine
//!
//! Orchestrates synchronization between the local wellness store and the
//! remote service:
//!
//! - **Full sync**: the three read operations run concurrently under one
//!   time budget; on success all three collections are replaced wholesale
//!   and derived statistics are recomputed. Any failure applies nothing.
//! - **Mutation sync**: optimistic writes are attempted immediately when
//!   online; failures leave the record unsynced and eligible for
//!   resubmission.
//! - **Scheduling**: a periodic tick (5 minutes by default), the network
//!   monitor's online event and confirmed mutations all trigger a sync.
//! - **Cancellation**: starting a new full sync cancels the in-flight read
//!   batch; a cancelled batch never mutates shared state.
//!
//! One engine instance is constructed per authenticated user and torn down
//! on logout.

pub mod scheduler;
pub mod stats;

use crate::cache::{CachedSnapshot, LocalCache};
use crate::client::SyncClient;
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::models::{
    GoalUpdate, MoodEntry, NewMoodEntry, SyncStatus, WellnessGoal, WellnessStats, WellnessStore,
};
use crate::network::{NetworkMonitor, NetworkStatus};
use crate::queue::{MutationEvent, OptimisticMutationQueue};
use chrono::{DateTime, Utc};
use scheduler::SyncScheduler;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Mutable engine state guarded by one lock. Invariants are re-validated
/// after every suspension point: the generation counter identifies the sync
/// attempt that is allowed to apply its results.
#[derive(Debug)]
struct EngineInner {
    last_sync: Option<DateTime<Utc>>,
    sync_in_progress: bool,
    errors: Vec<String>,
    generation: u64,
    cancel: Option<oneshot::Sender<()>>,
}

/// Offline-first synchronization engine for one authenticated user.
///
/// Clones share all state; the engine is cheap to clone into background
/// tasks.
#[derive(Debug)]
pub struct SyncEngine<C: SyncClient> {
    user_id: String,
    config: SyncConfig,
    client: Arc<C>,
    cache: Arc<LocalCache>,
    monitor: NetworkMonitor,
    queue: OptimisticMutationQueue,
    store: Arc<RwLock<WellnessStore>>,
    inner: Arc<RwLock<EngineInner>>,
    scheduler: Arc<SyncScheduler>,
    background: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<C: SyncClient> Clone for SyncEngine<C> {
    fn clone(&self) -> Self {
        Self {
            user_id: self.user_id.clone(),
            config: self.config.clone(),
            client: Arc::clone(&self.client),
            cache: Arc::clone(&self.cache),
            monitor: self.monitor.clone(),
            queue: self.queue.clone(),
            store: Arc::clone(&self.store),
            inner: Arc::clone(&self.inner),
            scheduler: Arc::clone(&self.scheduler),
            background: Arc::clone(&self.background),
        }
    }
}

impl<C: SyncClient> SyncEngine<C> {
    /// Construct an engine for one user and hydrate the store from the
    /// local cache. No network traffic happens here; call [`sync_data`] or
    /// [`start`] to reconcile with the remote service.
    ///
    /// [`sync_data`]: SyncEngine::sync_data
    /// [`start`]: SyncEngine::start
    pub async fn new(
        user_id: impl Into<String>,
        config: SyncConfig,
        client: C,
        cache: Arc<LocalCache>,
        monitor: NetworkMonitor,
    ) -> Self {
        let user_id = user_id.into();
        let snapshot = cache.load(&user_id).await;

        let store = WellnessStore {
            mood_entries: snapshot
                .mood_entries
                .into_iter()
                .map(|e| (e.id.clone(), e))
                .collect(),
            goals: snapshot
                .goals
                .into_iter()
                .map(|g| (g.id.clone(), g))
                .collect(),
            stats: snapshot.stats,
        };
        let store = Arc::new(RwLock::new(store));
        let queue = OptimisticMutationQueue::new(&user_id, Arc::clone(&store), Arc::clone(&cache));
        let scheduler = Arc::new(SyncScheduler::new(config.sync_interval));

        Self {
            user_id,
            config,
            client: Arc::new(client),
            cache,
            monitor,
            queue,
            store,
            inner: Arc::new(RwLock::new(EngineInner {
                last_sync: snapshot.last_sync,
                sync_in_progress: false,
                errors: Vec::new(),
                generation: 0,
                cancel: None,
            })),
            scheduler,
            background: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The mutation queue backing this engine.
    pub fn queue(&self) -> &OptimisticMutationQueue {
        &self.queue
    }

    /// The configuration this engine was constructed with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> Arc<C> {
        Arc::clone(&self.client)
    }

    /// The network monitor backing this engine.
    pub fn monitor(&self) -> &NetworkMonitor {
        &self.monitor
    }

    /// Start background synchronization: the periodic tick, and the
    /// listeners for network transitions and confirmed mutations.
    pub async fn start(&self) {
        let mut background = self.background.lock().await;
        if !background.is_empty() {
            tracing::debug!("sync engine already started");
            return;
        }

        let engine = self.clone();
        background.push(tokio::spawn(async move {
            engine.timer_loop().await;
        }));

        let engine = self.clone();
        background.push(tokio::spawn(async move {
            engine.event_loop().await;
        }));
    }

    /// Stop background tasks and cancel any in-flight read batch. Called on
    /// logout; in-memory state and the cache are left as they are.
    pub async fn shutdown(&self) {
        let mut background = self.background.lock().await;
        for handle in background.drain(..) {
            handle.abort();
        }

        let mut inner = self.inner.write().await;
        if let Some(cancel) = inner.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Tear down for an account switch: stop background tasks and drop all
    /// in-memory collections and status.
    pub async fn reset(&self) {
        self.shutdown().await;

        {
            let mut store = self.store.write().await;
            *store = WellnessStore::default();
        }
        let mut inner = self.inner.write().await;
        inner.last_sync = None;
        inner.sync_in_progress = false;
        inner.errors.clear();
    }

    async fn timer_loop(self) {
        let mut interval = tokio::time::interval(self.config.sync_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick fires immediately; skip it, construction already
        // hydrated from cache and callers decide when the first sync runs.
        interval.tick().await;

        loop {
            interval.tick().await;
            if !self.monitor.is_online() {
                continue;
            }
            if !self.scheduler.should_sync().await {
                tracing::debug!("periodic tick skipped, a sync ran recently");
                continue;
            }
            if let Err(e) = self.sync_data().await {
                if !e.is_operational() {
                    tracing::warn!(error = %e, "periodic sync failed");
                }
            }
        }
    }

    async fn event_loop(self) {
        let mut network_events = self.monitor.subscribe();
        let mut mutation_events = self.queue.subscribe();

        loop {
            tokio::select! {
                result = network_events.recv() => match result {
                    Ok(NetworkStatus::Online) => {
                        tracing::info!("back online, starting sync");
                        let _ = self.sync_data().await;
                    }
                    Ok(NetworkStatus::Offline) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                },
                result = mutation_events.recv() => match result {
                    Ok(MutationEvent::MoodEntryConfirmed { .. }) => {
                        // A confirmed entry changes the derived stats.
                        let _ = self.sync_data().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                },
            }
        }
    }

    /// Run a full synchronization: resubmit unsynced records, then fetch all
    /// three collections and replace local state with the canonical result.
    ///
    /// Skipped quietly while offline. A sync started while another is in
    /// flight cancels and supersedes it; the superseded attempt resolves to
    /// [`SyncError::Cancelled`] without touching shared state.
    pub async fn sync_data(&self) -> Result<(), SyncError> {
        let token = self.bearer_token()?;
        if !self.monitor.is_online() {
            tracing::debug!("skipping sync while offline");
            return Ok(());
        }

        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        let my_generation = {
            let mut inner = self.inner.write().await;
            if let Some(previous) = inner.cancel.take() {
                // Supersede the in-flight batch.
                let _ = previous.send(());
            }
            inner.generation += 1;
            inner.cancel = Some(cancel_tx);
            inner.sync_in_progress = true;
            inner.errors.clear();
            inner.generation
        };

        // Unsynced records first, so the subsequent reads return them with
        // canonical identifiers.
        self.flush_unsynced(&token).await;

        let reads = async {
            tokio::try_join!(
                self.client.fetch_mood_history(&token),
                self.client.fetch_goals(&token),
                self.client.fetch_insights(&token),
            )
        };
        let outcome = tokio::select! {
            _ = &mut cancel_rx => None,
            result = tokio::time::timeout(self.config.read_timeout, reads) => Some(result),
        };

        let mut inner = self.inner.write().await;
        if inner.generation != my_generation {
            // Superseded while the batch was in flight; results, if any, are
            // stale and must not be applied.
            return Err(SyncError::Cancelled);
        }
        inner.cancel = None;

        let (mood, goals, insights) = match outcome {
            None => {
                inner.sync_in_progress = false;
                return Err(SyncError::Cancelled);
            }
            Some(Err(_elapsed)) => {
                inner.sync_in_progress = false;
                inner.errors.push(SyncError::Timeout.to_string());
                tracing::warn!("sync read batch timed out");
                return Err(SyncError::Timeout);
            }
            Some(Ok(Err(e))) => {
                inner.sync_in_progress = false;
                inner.errors.push(e.to_string());
                tracing::warn!(error = %e, "sync failed");
                return Err(e);
            }
            Some(Ok(Ok(responses))) => responses,
        };

        let now = Utc::now();
        let entries: Vec<MoodEntry> = mood.into_iter().map(MoodEntry::from_remote).collect();
        let goals: Vec<WellnessGoal> = goals.into_iter().map(WellnessGoal::from_remote).collect();
        let new_stats = stats::build_stats(&entries, &insights, now);

        let snapshot = {
            let mut store = self.store.write().await;
            store.replace_all(entries, goals, new_stats);
            CachedSnapshot {
                mood_entries: store.mood_entries_sorted(),
                goals: store.goals_sorted(),
                stats: store.stats.clone(),
                last_sync: Some(now),
            }
        };

        inner.sync_in_progress = false;
        inner.last_sync = Some(now);
        drop(inner);

        self.scheduler.record_sync().await;
        self.cache.save(&self.user_id, &snapshot).await;
        tracing::info!(user_id = %self.user_id, "wellness data synchronized");
        Ok(())
    }

    /// Record a mood entry optimistically and, when online, push it to the
    /// remote service right away.
    ///
    /// The entry is visible locally (unsynced) before any network traffic.
    /// A failed write keeps the optimistic record and appends a message to
    /// the sync status; it is resubmitted by the next full sync or
    /// [`force_sync_all`].
    ///
    /// [`force_sync_all`]: SyncEngine::force_sync_all
    pub async fn add_mood_entry(&self, payload: NewMoodEntry) -> Result<MoodEntry, SyncError> {
        let entry = self.queue.enqueue_mood_entry(&payload).await;
        if !self.monitor.is_online() {
            return Ok(entry);
        }

        let token = match self.bearer_token() {
            Ok(token) => token,
            Err(e) => {
                self.record_error(&e).await;
                return Err(e);
            }
        };

        match self.client.create_mood_entry(&token, &payload).await {
            Ok(remote) => {
                let canonical = MoodEntry::from_remote(remote);
                {
                    let mut store = self.store.write().await;
                    store.confirm_mood_entry(&entry.id, canonical.clone());
                }
                self.queue.persist().await;
                self.queue.emit(MutationEvent::MoodEntryConfirmed {
                    id: canonical.id.clone(),
                });
                Ok(canonical)
            }
            Err(e) => {
                // Keep the optimistic record; it stays unsynced for retry.
                self.record_error(&e).await;
                Err(e)
            }
        }
    }

    /// Apply a partial goal update optimistically and, when online, push it
    /// to the remote service right away. A successful remote update replaces
    /// the whole local record with the server's canonical version.
    pub async fn update_wellness_goal(
        &self,
        goal_id: &str,
        update: GoalUpdate,
    ) -> Result<WellnessGoal, SyncError> {
        let goal = self
            .queue
            .enqueue_goal_update(goal_id, &update)
            .await
            .ok_or_else(|| SyncError::precondition(format!("Unknown goal: {}", goal_id)))?;
        if !self.monitor.is_online() {
            return Ok(goal);
        }

        let token = match self.bearer_token() {
            Ok(token) => token,
            Err(e) => {
                self.record_error(&e).await;
                return Err(e);
            }
        };

        match self.client.update_goal(&token, goal_id, &update).await {
            Ok(remote) => {
                let canonical = WellnessGoal::from_remote(remote);
                {
                    let mut store = self.store.write().await;
                    store.goals.insert(canonical.id.clone(), canonical.clone());
                }
                self.queue.persist().await;
                self.queue.emit(MutationEvent::GoalConfirmed {
                    id: canonical.id.clone(),
                });
                Ok(canonical)
            }
            Err(e) => {
                self.record_error(&e).await;
                Err(e)
            }
        }
    }

    /// Walk every unsynced record, resubmit it, then run a full sync.
    pub async fn force_sync_all(&self) -> Result<(), SyncError> {
        let token = self.bearer_token()?;
        if self.monitor.is_online() {
            self.flush_unsynced(&token).await;
        }
        self.sync_data().await
    }

    /// Resubmit unsynced mood entries and goals. Failures are recorded and
    /// the records stay unsynced; successes atomically swap the optimistic
    /// record for the canonical one.
    async fn flush_unsynced(&self, token: &str) {
        let (pending_entries, pending_goals) = {
            let store = self.store.read().await;
            (store.unsynced_mood_entries(), store.unsynced_goals())
        };
        if pending_entries.is_empty() && pending_goals.is_empty() {
            return;
        }

        for entry in pending_entries {
            let payload = NewMoodEntry {
                mood_score: entry.mood_score,
                energy: entry.energy,
                stress: entry.stress,
                notes: entry.notes.clone(),
                tags: entry.tags.clone(),
            };
            match self.client.create_mood_entry(token, &payload).await {
                Ok(remote) => {
                    let canonical = MoodEntry::from_remote(remote);
                    let mut store = self.store.write().await;
                    store.confirm_mood_entry(&entry.id, canonical);
                }
                Err(e) => self.record_error(&e).await,
            }
        }

        for goal in pending_goals {
            let payload = GoalUpdate::from_goal(&goal);
            match self.client.update_goal(token, &goal.id, &payload).await {
                Ok(remote) => {
                    let canonical = WellnessGoal::from_remote(remote);
                    let mut store = self.store.write().await;
                    store.goals.insert(canonical.id.clone(), canonical);
                }
                Err(e) => self.record_error(&e).await,
            }
        }

        self.queue.persist().await;
    }

    /// Current sync status snapshot.
    pub async fn sync_status(&self) -> SyncStatus {
        let inner = self.inner.read().await;
        let store = self.store.read().await;
        SyncStatus {
            is_online: self.monitor.is_online(),
            last_sync: inner.last_sync,
            sync_in_progress: inner.sync_in_progress,
            pending_changes: store.pending_changes(),
            errors: inner.errors.clone(),
        }
    }

    /// Mood entries, newest first.
    pub async fn mood_entries(&self) -> Vec<MoodEntry> {
        self.store.read().await.mood_entries_sorted()
    }

    /// Goals, ordered by name.
    pub async fn goals(&self) -> Vec<WellnessGoal> {
        self.store.read().await.goals_sorted()
    }

    /// Latest derived statistics, if any sync or cache hydration produced
    /// them.
    pub async fn stats(&self) -> Option<WellnessStats> {
        self.store.read().await.stats.clone()
    }

    /// All records still awaiting remote confirmation.
    pub async fn unsynced_data(&self) -> (Vec<MoodEntry>, Vec<WellnessGoal>) {
        let store = self.store.read().await;
        (store.unsynced_mood_entries(), store.unsynced_goals())
    }

    /// Drop accumulated error messages.
    pub async fn clear_sync_errors(&self) {
        self.inner.write().await.errors.clear();
    }

    fn bearer_token(&self) -> Result<String, SyncError> {
        self.config
            .bearer_token()
            .ok_or_else(|| SyncError::precondition("No authentication token found"))
    }

    async fn record_error(&self, error: &SyncError) {
        tracing::warn!(error = %error, "mutation sync failed");
        self.inner.write().await.errors.push(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RemoteGoal, RemoteInsights, RemoteMoodEntry};
    use crate::models::{SleepEntry, SocialEntry, StressEntry};

    /// Client that refuses every call; engine construction and offline
    /// behavior never reach the network.
    struct UnreachableClient;

    impl SyncClient for UnreachableClient {
        async fn fetch_mood_history(&self, _: &str) -> Result<Vec<RemoteMoodEntry>, SyncError> {
            panic!("unexpected network call");
        }
        async fn fetch_goals(&self, _: &str) -> Result<Vec<RemoteGoal>, SyncError> {
            panic!("unexpected network call");
        }
        async fn fetch_insights(&self, _: &str) -> Result<RemoteInsights, SyncError> {
            panic!("unexpected network call");
        }
        async fn create_mood_entry(
            &self,
            _: &str,
            _: &NewMoodEntry,
        ) -> Result<RemoteMoodEntry, SyncError> {
            panic!("unexpected network call");
        }
        async fn update_goal(
            &self,
            _: &str,
            _: &str,
            _: &GoalUpdate,
        ) -> Result<RemoteGoal, SyncError> {
            panic!("unexpected network call");
        }
        async fn fetch_stress_history(&self, _: &str) -> Result<Vec<StressEntry>, SyncError> {
            panic!("unexpected network call");
        }
        async fn fetch_sleep_history(&self, _: &str) -> Result<Vec<SleepEntry>, SyncError> {
            panic!("unexpected network call");
        }
        async fn fetch_social_history(&self, _: &str) -> Result<Vec<SocialEntry>, SyncError> {
            panic!("unexpected network call");
        }
    }

    async fn offline_engine() -> SyncEngine<UnreachableClient> {
        let cache = Arc::new(LocalCache::in_memory().await.unwrap());
        let config = SyncConfig::with_server_url("http://localhost:3000");
        config.set_token(Some("token".to_string()));
        SyncEngine::new(
            "user-1",
            config,
            UnreachableClient,
            cache,
            NetworkMonitor::new(NetworkStatus::Offline),
        )
        .await
    }

    #[tokio::test]
    async fn test_initial_status() {
        let engine = offline_engine().await;
        let status = engine.sync_status().await;
        assert!(!status.is_online);
        assert!(!status.sync_in_progress);
        assert_eq!(status.pending_changes, 0);
        assert!(status.last_sync.is_none());
        assert!(status.errors.is_empty());
    }

    #[tokio::test]
    async fn test_offline_mutation_stays_local() {
        let engine = offline_engine().await;
        let entry = engine
            .add_mood_entry(NewMoodEntry::with_score(4))
            .await
            .unwrap();
        assert!(!entry.synced);

        let status = engine.sync_status().await;
        assert_eq!(status.pending_changes, 1);
        assert!(status.errors.is_empty());
    }

    #[tokio::test]
    async fn test_sync_skipped_while_offline() {
        let engine = offline_engine().await;
        // Must not hit the panicking client.
        engine.sync_data().await.unwrap();
    }

    #[tokio::test]
    async fn test_sync_requires_token() {
        let cache = Arc::new(LocalCache::in_memory().await.unwrap());
        let config = SyncConfig::with_server_url("http://localhost:3000");
        let engine = SyncEngine::new(
            "user-1",
            config,
            UnreachableClient,
            cache,
            NetworkMonitor::new(NetworkStatus::Online),
        )
        .await;

        let err = engine.sync_data().await.unwrap_err();
        assert!(matches!(err, SyncError::Precondition { .. }));
    }

    #[tokio::test]
    async fn test_hydration_from_cache() {
        let cache = Arc::new(LocalCache::in_memory().await.unwrap());
        let snapshot = CachedSnapshot {
            mood_entries: vec![MoodEntry::optimistic(&NewMoodEntry::with_score(3))],
            last_sync: Some(Utc::now()),
            ..CachedSnapshot::default()
        };
        cache.save("user-1", &snapshot).await;

        let config = SyncConfig::with_server_url("http://localhost:3000");
        let engine = SyncEngine::new(
            "user-1",
            config,
            UnreachableClient,
            Arc::clone(&cache),
            NetworkMonitor::new(NetworkStatus::Offline),
        )
        .await;

        assert_eq!(engine.mood_entries().await.len(), 1);
        let status = engine.sync_status().await;
        assert_eq!(status.pending_changes, 1);
        assert!(status.last_sync.is_some());
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let engine = offline_engine().await;
        engine
            .add_mood_entry(NewMoodEntry::with_score(2))
            .await
            .unwrap();
        engine.reset().await;

        assert!(engine.mood_entries().await.is_empty());
        let status = engine.sync_status().await;
        assert_eq!(status.pending_changes, 0);
        assert!(status.last_sync.is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_goal() {
        let engine = offline_engine().await;
        let err = engine
            .update_wellness_goal("missing", GoalUpdate::current(1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Precondition { .. }));
    }
}
