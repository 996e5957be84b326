//! Shared helpers for integration tests: an in-memory stub sync client with
//! call counters and switchable failure modes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wellsync::models::{RemoteGoal, RemoteInsights, RemoteMoodEntry};
use wellsync::{
    GoalUpdate, NetworkMonitor, NetworkStatus, NewMoodEntry, SleepEntry, SocialEntry, StressEntry,
    SyncClient, SyncConfig, SyncEngine, SyncError,
};

/// Server-side state the stub serves and mutates.
#[derive(Debug, Default)]
pub struct StubState {
    pub mood_history: Vec<RemoteMoodEntry>,
    pub goals: Vec<RemoteGoal>,
    pub insights: RemoteInsights,
    pub stress: Vec<StressEntry>,
    pub sleep: Vec<SleepEntry>,
    pub social: Vec<SocialEntry>,
    /// Every read returns an HTTP failure
    pub fail_reads: bool,
    /// Only `fetch_goals` fails, for all-or-nothing assertions
    pub fail_goal_read: bool,
    /// Every write returns a remote-write failure
    pub fail_writes: bool,
    /// One-shot delay (ms) applied to the next `fetch_mood_history` call
    pub delay_next_read_ms: Option<u64>,
    next_id: usize,
}

impl StubState {
    fn next_mood_id(&mut self) -> String {
        self.next_id += 1;
        format!("m{}", self.next_id)
    }
}

/// Stub implementation of [`SyncClient`]. Clones share state and counters,
/// so tests keep a handle after handing a clone to the engine.
#[derive(Debug, Clone, Default)]
pub struct StubClient {
    pub state: Arc<Mutex<StubState>>,
    pub read_calls: Arc<AtomicUsize>,
    pub create_calls: Arc<AtomicUsize>,
    pub update_calls: Arc<AtomicUsize>,
}

impl StubClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_count(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn with_state(&self, f: impl FnOnce(&mut StubState)) {
        f(&mut self.state.lock().unwrap());
    }

    /// Seed one goal on the stub server.
    pub fn seed_goal(&self, id: &str, name: &str, current: f64, target: f64) {
        self.with_state(|state| {
            state.goals.push(RemoteGoal {
                id: id.to_string(),
                name: name.to_string(),
                current,
                target,
                unit: "sessions".to_string(),
                category: wellsync::GoalCategory::Mood,
            });
        });
    }

    fn check_reads(&self) -> Result<(), SyncError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.lock().unwrap().fail_reads {
            return Err(SyncError::http("Failed to fetch wellness data: 500"));
        }
        Ok(())
    }
}

impl SyncClient for StubClient {
    async fn fetch_mood_history(&self, _token: &str) -> Result<Vec<RemoteMoodEntry>, SyncError> {
        let delay = self.state.lock().unwrap().delay_next_read_ms.take();
        if let Some(ms) = delay {
            tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
        }
        self.check_reads()?;
        Ok(self.state.lock().unwrap().mood_history.clone())
    }

    async fn fetch_goals(&self, _token: &str) -> Result<Vec<RemoteGoal>, SyncError> {
        self.check_reads()?;
        let state = self.state.lock().unwrap();
        if state.fail_goal_read {
            return Err(SyncError::http("Failed to fetch goals: 500"));
        }
        Ok(state.goals.clone())
    }

    async fn fetch_insights(&self, _token: &str) -> Result<RemoteInsights, SyncError> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().insights.clone())
    }

    async fn create_mood_entry(
        &self,
        _token: &str,
        payload: &NewMoodEntry,
    ) -> Result<RemoteMoodEntry, SyncError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(SyncError::remote_write(
                "Failed to save mood entry: 500 - server error",
            ));
        }
        let entry = RemoteMoodEntry {
            id: state.next_mood_id(),
            created_at: chrono::Utc::now(),
            mood_score: payload.mood_score,
            energy: payload.energy,
            stress: payload.stress,
            notes: payload.notes.clone(),
            tags: payload.tags.clone(),
        };
        state.mood_history.push(entry.clone());
        Ok(entry)
    }

    async fn update_goal(
        &self,
        _token: &str,
        goal_id: &str,
        payload: &GoalUpdate,
    ) -> Result<RemoteGoal, SyncError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(SyncError::remote_write(
                "Failed to update goal: 500 - server error",
            ));
        }
        let goal = state
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| SyncError::remote_write("Failed to update goal: 404 - not found"))?;
        if let Some(name) = &payload.name {
            goal.name = name.clone();
        }
        if let Some(current) = payload.current {
            goal.current = current;
        }
        if let Some(target) = payload.target {
            goal.target = target;
        }
        if let Some(unit) = &payload.unit {
            goal.unit = unit.clone();
        }
        if let Some(category) = payload.category {
            goal.category = category;
        }
        Ok(goal.clone())
    }

    async fn fetch_stress_history(&self, _token: &str) -> Result<Vec<StressEntry>, SyncError> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().stress.clone())
    }

    async fn fetch_sleep_history(&self, _token: &str) -> Result<Vec<SleepEntry>, SyncError> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().sleep.clone())
    }

    async fn fetch_social_history(&self, _token: &str) -> Result<Vec<SocialEntry>, SyncError> {
        self.check_reads()?;
        Ok(self.state.lock().unwrap().social.clone())
    }
}

/// Engine wired to an in-memory cache, a stub client and an initially
/// offline network monitor.
pub async fn stub_engine(user_id: &str) -> (SyncEngine<StubClient>, StubClient, NetworkMonitor) {
    let client = StubClient::new();
    let monitor = NetworkMonitor::new(NetworkStatus::Offline);
    let cache = Arc::new(wellsync::LocalCache::in_memory().await.unwrap());
    let config = SyncConfig::with_server_url("http://localhost:3000");
    config.set_token(Some("test-token".to_string()));

    let engine = SyncEngine::new(user_id, config, client.clone(), cache, monitor.clone()).await;
    (engine, client, monitor)
}
