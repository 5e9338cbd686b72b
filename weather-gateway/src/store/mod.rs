//! Persistence seams for the weather cache, the provenance trail and
//! per-user saved cities.
//!
//! All traits are implemented by [`postgres::PgStore`] and
//! [`memory::MemoryStore`]. Implementations must be safe to share between
//! concurrent requests; the orchestrator does no locking of its own around
//! individual store calls.

pub mod memory;
pub mod migrations;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::errors::AppError;
use uuid::Uuid;

use crate::models::{
    ApiRequestLog, LocationHistoryEntry, NewRequestLog, NewSnapshot, SavedCity, WeatherSnapshot,
};

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Most recently inserted snapshot for `city_name` with `expiry_time > now`.
    /// Matching is exact: case and whitespace sensitive.
    async fn find_valid(
        &self,
        city_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherSnapshot>, AppError>;

    /// Remove every snapshot with `expiry_time <= now`. Returns the count removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// Store a new snapshot and return it as persisted. No uniqueness is
    /// enforced on `city_name`.
    async fn insert(&self, snapshot: NewSnapshot) -> Result<WeatherSnapshot, AppError>;

    async fn delete_all(&self) -> Result<u64, AppError>;

    async fn delete_for_city(&self, city_name: &str) -> Result<u64, AppError>;
}

#[async_trait]
pub trait ProvenanceStore: Send + Sync {
    /// Insert or replace the entry keyed by `(user_id, city_name)`.
    async fn upsert_history(
        &self,
        entry: LocationHistoryEntry,
    ) -> Result<LocationHistoryEntry, AppError>;

    /// Newest first
    async fn list_history(&self, user_id: Uuid) -> Result<Vec<LocationHistoryEntry>, AppError>;

    async fn delete_history(&self, user_id: Uuid, city_name: &str) -> Result<bool, AppError>;

    async fn append_request_log(&self, log: NewRequestLog) -> Result<ApiRequestLog, AppError>;
}

#[async_trait]
pub trait SavedCityStore: Send + Sync {
    /// Save `city` for its user. Saving an already saved city refreshes its
    /// coordinates and keeps the original `saved_at`.
    async fn save_city(&self, city: SavedCity) -> Result<SavedCity, AppError>;

    /// Oldest first
    async fn list_saved(&self, user_id: Uuid) -> Result<Vec<SavedCity>, AppError>;

    async fn delete_saved(&self, user_id: Uuid, city_name: &str) -> Result<bool, AppError>;
}
