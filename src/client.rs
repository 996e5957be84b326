//! Remote Sync Client
//!
//! HTTP client for the wellness service: three read operations feeding the
//! full sync, two mutation operations, and the read-only mirror history
//! feeds used by the facade. Every call carries a bearer credential obtained
//! from the auth layer.
//!
//! The [`SyncClient`] trait is the seam the engine is generic over; tests
//! substitute a stub implementation with canned responses and call counters.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::models::{
    GoalUpdate, NewMoodEntry, RemoteGoal, RemoteInsights, RemoteMoodEntry, SleepEntry,
    SocialEntry, StressEntry,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::future::Future;

/// Operations the sync engine needs from the remote service.
pub trait SyncClient: Send + Sync + 'static {
    /// `GET /wellness/mood/history`
    fn fetch_mood_history(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<RemoteMoodEntry>, SyncError>> + Send;

    /// `GET /wellness/goals`
    fn fetch_goals(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<RemoteGoal>, SyncError>> + Send;

    /// `GET /wellness/insights`
    fn fetch_insights(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<RemoteInsights, SyncError>> + Send;

    /// `POST /wellness/mood`
    fn create_mood_entry(
        &self,
        token: &str,
        payload: &NewMoodEntry,
    ) -> impl Future<Output = Result<RemoteMoodEntry, SyncError>> + Send;

    /// `PUT /wellness/goals/{goalId}`
    fn update_goal(
        &self,
        token: &str,
        goal_id: &str,
        payload: &GoalUpdate,
    ) -> impl Future<Output = Result<RemoteGoal, SyncError>> + Send;

    /// `GET /wellness/stress/history`
    fn fetch_stress_history(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<StressEntry>, SyncError>> + Send;

    /// `GET /wellness/sleep/history`
    fn fetch_sleep_history(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<SleepEntry>, SyncError>> + Send;

    /// `GET /wellness/social/history`
    fn fetch_social_history(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Vec<SocialEntry>, SyncError>> + Send;
}

/// Production client backed by `reqwest`.
///
/// Reads are bounded by the configured read timeout and exceeding it fails
/// the operation with [`SyncError::Timeout`] rather than hanging. Mutation
/// writes are bounded by the write timeout; their failures map to
/// [`SyncError::RemoteWrite`] so the caller keeps the optimistic record
/// flagged unsynced.
#[derive(Debug, Clone)]
pub struct HttpSyncClient {
    config: SyncConfig,
    client: Client,
}

impl HttpSyncClient {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        what: &str,
    ) -> Result<T, SyncError> {
        let url = self.config.api_url(path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .timeout(self.config.read_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::http(format!(
                "Failed to fetch {}: {}",
                what,
                response.status()
            )));
        }

        response.json::<T>().await.map_err(SyncError::from)
    }

    async fn decode_write<T: DeserializeOwned>(
        response: Response,
        what: &str,
    ) -> Result<T, SyncError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| status.to_string());
            return Err(SyncError::remote_write(format!(
                "Failed to {}: {} - {}",
                what, status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::serialization(format!("Failed to parse response: {}", e)))
    }
}

impl SyncClient for HttpSyncClient {
    async fn fetch_mood_history(&self, token: &str) -> Result<Vec<RemoteMoodEntry>, SyncError> {
        self.get_json("/wellness/mood/history", token, "mood data")
            .await
    }

    async fn fetch_goals(&self, token: &str) -> Result<Vec<RemoteGoal>, SyncError> {
        self.get_json("/wellness/goals", token, "goals data").await
    }

    async fn fetch_insights(&self, token: &str) -> Result<RemoteInsights, SyncError> {
        self.get_json("/wellness/insights", token, "stats data")
            .await
    }

    async fn create_mood_entry(
        &self,
        token: &str,
        payload: &NewMoodEntry,
    ) -> Result<RemoteMoodEntry, SyncError> {
        let url = self.config.api_url("/wellness/mood");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .timeout(self.config.write_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| SyncError::remote_write(format!("Network error: {}", e)))?;

        Self::decode_write(response, "save mood entry").await
    }

    async fn update_goal(
        &self,
        token: &str,
        goal_id: &str,
        payload: &GoalUpdate,
    ) -> Result<RemoteGoal, SyncError> {
        let url = self.config.api_url(&format!("/wellness/goals/{}", goal_id));
        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .timeout(self.config.write_timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| SyncError::remote_write(format!("Network error: {}", e)))?;

        Self::decode_write(response, "update goal").await
    }

    async fn fetch_stress_history(&self, token: &str) -> Result<Vec<StressEntry>, SyncError> {
        self.get_json("/wellness/stress/history", token, "stress data")
            .await
    }

    async fn fetch_sleep_history(&self, token: &str) -> Result<Vec<SleepEntry>, SyncError> {
        self.get_json("/wellness/sleep/history", token, "sleep data")
            .await
    }

    async fn fetch_social_history(&self, token: &str) -> Result<Vec<SocialEntry>, SyncError> {
        self.get_json("/wellness/social/history", token, "social data")
            .await
    }
}
