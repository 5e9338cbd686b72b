use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::errors::AppError;
use sqlx::PgPool;
use uuid::Uuid;

use super::{CacheStore, ProvenanceStore, SavedCityStore, migrations};
use crate::models::{
    ApiRequestLog, LocationHistoryEntry, NewRequestLog, NewSnapshot, SavedCity, WeatherSnapshot,
};

const SNAPSHOT_COLUMNS: &str = "id, city_name, latitude, longitude, temperature, humidity, \
     wind_speed, forecast_data, cached_at, expiry_time";

/// PostgreSQL-backed store. Concurrency is left to the database.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and bring the schema up to date
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;

        migrations::run_migrations(&pool).await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CacheStore for PgStore {
    async fn find_valid(
        &self,
        city_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherSnapshot>, AppError> {
        let snapshot = sqlx::query_as::<_, WeatherSnapshot>(&format!(
            r#"
            SELECT {SNAPSHOT_COLUMNS}
            FROM weather_cache
            WHERE city_name = $1 AND expiry_time > $2
            ORDER BY id DESC
            LIMIT 1
            "#
        ))
        .bind(city_name)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM weather_cache WHERE expiry_time <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert(&self, snapshot: NewSnapshot) -> Result<WeatherSnapshot, AppError> {
        let stored = sqlx::query_as::<_, WeatherSnapshot>(&format!(
            r#"
            INSERT INTO weather_cache
                (city_name, latitude, longitude, temperature, humidity, wind_speed,
                 forecast_data, cached_at, expiry_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SNAPSHOT_COLUMNS}
            "#
        ))
        .bind(&snapshot.city_name)
        .bind(snapshot.latitude)
        .bind(snapshot.longitude)
        .bind(snapshot.temperature)
        .bind(snapshot.humidity)
        .bind(snapshot.wind_speed)
        .bind(&snapshot.forecast_data)
        .bind(snapshot.cached_at)
        .bind(snapshot.expiry_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM weather_cache")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_for_city(&self, city_name: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM weather_cache WHERE city_name = $1
            "#,
        )
        .bind(city_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ProvenanceStore for PgStore {
    async fn upsert_history(
        &self,
        entry: LocationHistoryEntry,
    ) -> Result<LocationHistoryEntry, AppError> {
        let stored = sqlx::query_as::<_, LocationHistoryEntry>(
            r#"
            INSERT INTO location_history (user_id, city_name, latitude, longitude, search_time)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, city_name) DO UPDATE
                SET latitude = EXCLUDED.latitude,
                    longitude = EXCLUDED.longitude,
                    search_time = EXCLUDED.search_time
            RETURNING user_id, city_name, latitude, longitude, search_time
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.city_name)
        .bind(entry.latitude)
        .bind(entry.longitude)
        .bind(entry.search_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn list_history(&self, user_id: Uuid) -> Result<Vec<LocationHistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, LocationHistoryEntry>(
            r#"
            SELECT user_id, city_name, latitude, longitude, search_time
            FROM location_history
            WHERE user_id = $1
            ORDER BY search_time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn delete_history(&self, user_id: Uuid, city_name: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM location_history WHERE user_id = $1 AND city_name = $2
            "#,
        )
        .bind(user_id)
        .bind(city_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_request_log(&self, log: NewRequestLog) -> Result<ApiRequestLog, AppError> {
        let stored = sqlx::query_as::<_, ApiRequestLog>(
            r#"
            INSERT INTO api_request_logs
                (user_id, city_name, request_url, response_status, response_data, request_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, city_name, request_url, response_status, response_data,
                      request_time
            "#,
        )
        .bind(log.user_id)
        .bind(&log.city_name)
        .bind(&log.request_url)
        .bind(log.response_status)
        .bind(&log.response_data)
        .bind(log.request_time)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }
}

#[async_trait]
impl SavedCityStore for PgStore {
    async fn save_city(&self, city: SavedCity) -> Result<SavedCity, AppError> {
        let stored = sqlx::query_as::<_, SavedCity>(
            r#"
            INSERT INTO saved_cities (user_id, city_name, latitude, longitude, saved_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, city_name) DO UPDATE
                SET latitude = EXCLUDED.latitude,
                    longitude = EXCLUDED.longitude
            RETURNING user_id, city_name, latitude, longitude, saved_at
            "#,
        )
        .bind(city.user_id)
        .bind(&city.city_name)
        .bind(city.latitude)
        .bind(city.longitude)
        .bind(city.saved_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn list_saved(&self, user_id: Uuid) -> Result<Vec<SavedCity>, AppError> {
        let cities = sqlx::query_as::<_, SavedCity>(
            r#"
            SELECT user_id, city_name, latitude, longitude, saved_at
            FROM saved_cities
            WHERE user_id = $1
            ORDER BY saved_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(cities)
    }

    async fn delete_saved(&self, user_id: Uuid, city_name: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM saved_cities WHERE user_id = $1 AND city_name = $2
            "#,
        )
        .bind(user_id)
        .bind(city_name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
