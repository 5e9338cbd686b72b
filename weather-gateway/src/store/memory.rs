use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::errors::AppError;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CacheStore, ProvenanceStore, SavedCityStore};
use crate::models::{
    ApiRequestLog, LocationHistoryEntry, NewRequestLog, NewSnapshot, SavedCity, WeatherSnapshot,
};

#[derive(Default)]
struct Tables {
    snapshots: Vec<WeatherSnapshot>,
    history: HashMap<(Uuid, String), LocationHistoryEntry>,
    request_logs: VecDeque<ApiRequestLog>,
    saved_cities: HashMap<(Uuid, String), SavedCity>,
    next_snapshot_id: i64,
    next_log_id: i64,
}

/// Request log entries kept by [`MemoryStore::new`]
pub const DEFAULT_REQUEST_LOG_CAPACITY: usize = 10_000;

/// Process-local store, used when no database is configured and in tests.
///
/// The request log is a ring: once full, each append evicts the oldest entry.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    request_log_capacity: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_request_log_capacity(DEFAULT_REQUEST_LOG_CAPACITY)
    }

    pub fn with_request_log_capacity(capacity: usize) -> Self {
        Self {
            tables: Arc::default(),
            request_log_capacity: capacity.max(1),
        }
    }

    /// Every stored snapshot, expired or not, in insertion order
    pub async fn snapshots(&self) -> Vec<WeatherSnapshot> {
        self.tables.read().await.snapshots.clone()
    }

    /// Every request log entry, oldest first
    pub async fn request_logs(&self) -> Vec<ApiRequestLog> {
        self.tables
            .read()
            .await
            .request_logs
            .iter()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn find_valid(
        &self,
        city_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherSnapshot>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .snapshots
            .iter()
            .filter(|s| s.city_name == city_name && s.is_valid_at(now))
            .max_by_key(|s| s.id)
            .cloned())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.snapshots.len();
        tables.snapshots.retain(|s| s.is_valid_at(now));
        Ok((before - tables.snapshots.len()) as u64)
    }

    async fn insert(&self, snapshot: NewSnapshot) -> Result<WeatherSnapshot, AppError> {
        let mut tables = self.tables.write().await;
        tables.next_snapshot_id += 1;
        let stored = snapshot.into_snapshot(tables.next_snapshot_id);
        tables.snapshots.push(stored.clone());
        Ok(stored)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let removed = tables.snapshots.len();
        tables.snapshots.clear();
        Ok(removed as u64)
    }

    async fn delete_for_city(&self, city_name: &str) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.snapshots.len();
        tables.snapshots.retain(|s| s.city_name != city_name);
        Ok((before - tables.snapshots.len()) as u64)
    }
}

#[async_trait]
impl ProvenanceStore for MemoryStore {
    async fn upsert_history(
        &self,
        entry: LocationHistoryEntry,
    ) -> Result<LocationHistoryEntry, AppError> {
        let mut tables = self.tables.write().await;
        tables
            .history
            .insert((entry.user_id, entry.city_name.clone()), entry.clone());
        Ok(entry)
    }

    async fn list_history(&self, user_id: Uuid) -> Result<Vec<LocationHistoryEntry>, AppError> {
        let tables = self.tables.read().await;
        let mut entries: Vec<LocationHistoryEntry> = tables
            .history
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.search_time.cmp(&a.search_time));
        Ok(entries)
    }

    async fn delete_history(&self, user_id: Uuid, city_name: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .history
            .remove(&(user_id, city_name.to_string()))
            .is_some())
    }

    async fn append_request_log(&self, log: NewRequestLog) -> Result<ApiRequestLog, AppError> {
        let mut tables = self.tables.write().await;
        tables.next_log_id += 1;
        let stored = ApiRequestLog {
            id: tables.next_log_id,
            user_id: log.user_id,
            city_name: log.city_name,
            request_url: log.request_url,
            response_status: log.response_status,
            response_data: log.response_data,
            request_time: log.request_time,
        };
        while tables.request_logs.len() >= self.request_log_capacity {
            tables.request_logs.pop_front();
        }
        tables.request_logs.push_back(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl SavedCityStore for MemoryStore {
    async fn save_city(&self, city: SavedCity) -> Result<SavedCity, AppError> {
        let (latitude, longitude) = (city.latitude, city.longitude);
        let mut tables = self.tables.write().await;
        let stored = tables
            .saved_cities
            .entry((city.user_id, city.city_name.clone()))
            .and_modify(|saved| {
                saved.latitude = latitude;
                saved.longitude = longitude;
            })
            .or_insert(city);
        Ok(stored.clone())
    }

    async fn list_saved(&self, user_id: Uuid) -> Result<Vec<SavedCity>, AppError> {
        let tables = self.tables.read().await;
        let mut cities: Vec<SavedCity> = tables
            .saved_cities
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        cities.sort_by(|a, b| a.saved_at.cmp(&b.saved_at));
        Ok(cities)
    }

    async fn delete_saved(&self, user_id: Uuid, city_name: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .saved_cities
            .remove(&(user_id, city_name.to_string()))
            .is_some())
    }
}
