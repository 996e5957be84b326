//! Local Cache
//!
//! Durable per-user persistence for the three synchronized collections and
//! the last-sync timestamp, backed by SQLite. Each snapshot piece is stored
//! as serialized JSON under a key namespaced by user id, so switching
//! accounts cannot leak data across sessions.
//!
//! The cache is deliberately forgiving: `load` never fails (missing or
//! corrupt rows yield empty defaults and a logged warning) and `save` is
//! best-effort (failures are swallowed; in-memory state stays authoritative
//! for the session).

use crate::models::{MoodEntry, WellnessGoal, WellnessStats};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};

const KEY_MOOD_ENTRIES: &str = "mood_entries";
const KEY_GOALS: &str = "goals";
const KEY_STATS: &str = "stats";
const KEY_LAST_SYNC: &str = "last_sync";

/// Everything the cache holds for one user.
#[derive(Debug, Clone, Default)]
pub struct CachedSnapshot {
    pub mood_entries: Vec<MoodEntry>,
    pub goals: Vec<WellnessGoal>,
    pub stats: Option<WellnessStats>,
    pub last_sync: Option<DateTime<Utc>>,
}

/// SQLite-backed key-value cache, namespaced per user identifier.
#[derive(Debug)]
pub struct LocalCache {
    pool: SqlitePool,
}

impl LocalCache {
    /// Open or create the cache database at the given path.
    ///
    /// Uses WAL mode for better concurrency.
    pub async fn open(path: impl AsRef<Path>) -> sqlx::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;

        let cache = Self { pool };
        cache.init_schema().await?;
        Ok(cache)
    }

    /// Open the cache at the platform-specific default location.
    pub async fn open_default() -> sqlx::Result<Self> {
        Self::open(Self::default_path()).await
    }

    /// In-memory cache for tests.
    pub async fn in_memory() -> sqlx::Result<Self> {
        // A single connection so every query sees the same memory database.
        let options = SqliteConnectOptions::new().in_memory(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let cache = Self { pool };
        cache.init_schema().await?;
        Ok(cache)
    }

    /// Platform-specific default database path.
    fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("wellsync");
        path.push("cache.db");
        path
    }

    async fn init_schema(&self) -> sqlx::Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS wellness_cache (
                user_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, key)
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Load the cached snapshot for a user. Never fails; anything missing or
    /// unreadable comes back as its empty default.
    pub async fn load(&self, user_id: &str) -> CachedSnapshot {
        CachedSnapshot {
            mood_entries: self
                .load_value(user_id, KEY_MOOD_ENTRIES)
                .await
                .unwrap_or_default(),
            goals: self.load_value(user_id, KEY_GOALS).await.unwrap_or_default(),
            stats: self.load_value(user_id, KEY_STATS).await,
            last_sync: self.load_value(user_id, KEY_LAST_SYNC).await,
        }
    }

    /// Persist a snapshot for a user. Best-effort; failures are logged and
    /// swallowed.
    pub async fn save(&self, user_id: &str, snapshot: &CachedSnapshot) {
        self.save_value(user_id, KEY_MOOD_ENTRIES, &snapshot.mood_entries)
            .await;
        self.save_value(user_id, KEY_GOALS, &snapshot.goals).await;
        if let Some(stats) = &snapshot.stats {
            self.save_value(user_id, KEY_STATS, stats).await;
        }
        if let Some(last_sync) = &snapshot.last_sync {
            self.save_value(user_id, KEY_LAST_SYNC, last_sync).await;
        }
    }

    /// Remove all cached data for a user (logout / account switch).
    pub async fn clear(&self, user_id: &str) {
        if let Err(e) = sqlx::query("DELETE FROM wellness_cache WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
        {
            tracing::warn!(user_id, error = %e, "failed to clear cached wellness data");
        }
    }

    async fn load_value<T: DeserializeOwned>(&self, user_id: &str, key: &str) -> Option<T> {
        let row = match sqlx::query("SELECT value FROM wellness_cache WHERE user_id = ? AND key = ?")
            .bind(user_id)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row?,
            Err(e) => {
                tracing::warn!(user_id, key, error = %e, "failed to read cached wellness data");
                return None;
            }
        };

        let value: String = match row.try_get("value") {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(user_id, key, error = %e, "failed to read cached wellness data");
                return None;
            }
        };

        match serde_json::from_str(&value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(user_id, key, error = %e, "corrupt cache entry, using defaults");
                None
            }
        }
    }

    async fn save_value<T: Serialize>(&self, user_id: &str, key: &str, value: &T) {
        let serialized = match serde_json::to_string(value) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::warn!(user_id, key, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        let result = sqlx::query(
            "INSERT OR REPLACE INTO wellness_cache (user_id, key, value, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(key)
        .bind(&serialized)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::warn!(user_id, key, error = %e, "failed to save cached wellness data");
        }
    }

    /// Connection pool reference, for tests
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
