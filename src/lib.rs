//! WellSync - Offline-First Wellness Data Synchronization
//!
//! WellSync keeps a client-side copy of a user's wellness data (mood
//! entries, goals, derived statistics) consistent with a remote service
//! while staying fully usable offline.
//!
//! # Overview
//!
//! - Mutations apply optimistically to local state and are flagged
//!   `synced=false` until the remote service confirms them
//! - A full sync fetches all three collections concurrently and replaces
//!   local state all-or-nothing; a sync started while another is in flight
//!   cancels and supersedes it
//! - A SQLite cache, namespaced per user, hydrates the store at startup and
//!   absorbs every local change so restarts and offline periods lose nothing
//! - Connectivity transitions, a periodic timer and confirmed writes all
//!   trigger background synchronization
//!
//! # Module Structure
//!
//! - **`models`** - Domain records, wire types and the in-memory store
//! - **`error`** - The [`SyncError`] taxonomy
//! - **`config`** - Server URL, bearer token and timing configuration
//! - **`cache`** - SQLite-backed [`LocalCache`]
//! - **`network`** - [`NetworkMonitor`] with a connectivity event stream
//! - **`queue`** - [`OptimisticMutationQueue`] for offline-safe writes
//! - **`client`** - The [`SyncClient`] trait and its reqwest implementation
//! - **`engine`** - The [`SyncEngine`] orchestrator and derived statistics
//! - **`facade`** - [`WellnessDataFacade`], the surface UI layers consume
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wellsync::{
//!     HttpSyncClient, LocalCache, NetworkMonitor, NetworkStatus, SyncConfig,
//!     SyncEngine, WellnessDataFacade,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::new();
//! config.set_token(Some("bearer-token".to_string()));
//!
//! let cache = Arc::new(LocalCache::open_default().await?);
//! let monitor = NetworkMonitor::new(NetworkStatus::Online);
//! let client = HttpSyncClient::new(config.clone());
//!
//! let engine = SyncEngine::new("user-1", config, client, cache, monitor).await;
//! engine.start().await;
//!
//! let facade = WellnessDataFacade::new(engine);
//! facade.refresh_data().await?;
//! # Ok(())
//! # }
//! ```
//!
//! No tracing subscriber is installed here; the embedding application owns
//! logging setup.

pub mod cache;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod facade;
pub mod models;
pub mod network;
pub mod queue;

pub use cache::{CachedSnapshot, LocalCache};
pub use client::{HttpSyncClient, SyncClient};
pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use error::SyncError;
pub use facade::{MoodEntryView, WellnessDataFacade, WellnessPreferences};
pub use models::{
    GoalCategory, GoalUpdate, MoodEntry, NewMoodEntry, SleepEntry, SocialEntry, StressEntry,
    SyncStatus, WellnessGoal, WellnessStats, WellnessStore,
};
pub use network::{NetworkMonitor, NetworkStatus};
pub use queue::{MutationEvent, OptimisticMutationQueue};
