use chrono::Utc;
use common::errors::AppError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::forecast::ForecastClient;
use crate::geocoding::{GeoCandidate, GeocodingClient};
use crate::models::{
    CACHE_HIT_MARKER, Coordinates, MAX_CITY_NAME_CHARS, NewSnapshot, WeatherSnapshot,
};
use crate::provenance::ProvenanceRecorder;
use crate::single_flight::KeyedLocks;
use crate::store::CacheStore;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("City name must be between 1 and 99 characters")]
    InvalidCity,

    #[error("City not found")]
    CityNotFound,

    #[error("Weather data not available")]
    WeatherUnavailable,

    #[error("Upstream failure: {0}")]
    Upstream(AppError),

    #[error("Store failure: {0}")]
    Store(AppError),
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidCity | ResolveError::CityNotFound => {
                AppError::not_found("City not found")
            }
            ResolveError::WeatherUnavailable => AppError::not_found("Weather data not available"),
            ResolveError::Upstream(e) | ResolveError::Store(e) => e,
        }
    }
}

pub fn validate_city_name(city_name: &str) -> Result<(), ResolveError> {
    let len = city_name.chars().count();
    if len == 0 || len > MAX_CITY_NAME_CHARS {
        return Err(ResolveError::InvalidCity);
    }
    Ok(())
}

/// Cache-check, fetch, normalize, store and record pipeline for
/// weather-by-city lookups.
pub struct WeatherOrchestrator {
    geocoder: Arc<GeocodingClient>,
    forecast: Arc<ForecastClient>,
    cache: Arc<dyn CacheStore>,
    provenance: ProvenanceRecorder,
    // Concurrent lookups of one city share a single upstream fetch
    city_locks: KeyedLocks,
}

impl WeatherOrchestrator {
    pub fn new(
        geocoder: Arc<GeocodingClient>,
        forecast: Arc<ForecastClient>,
        cache: Arc<dyn CacheStore>,
        provenance: ProvenanceRecorder,
    ) -> Self {
        Self {
            geocoder,
            forecast,
            cache,
            provenance,
            city_locks: KeyedLocks::new(),
        }
    }

    /// Resolve current weather for `city_name`, attributing the lookup to
    /// `user_id` when the caller is authenticated.
    #[instrument(skip(self), fields(city = %city_name))]
    pub async fn resolve(
        &self,
        city_name: &str,
        user_id: Option<Uuid>,
    ) -> Result<WeatherSnapshot, ResolveError> {
        validate_city_name(city_name)?;

        let guard = self.city_locks.lock(city_name).await;

        let now = Utc::now();
        let swept = self
            .cache
            .delete_expired(now)
            .await
            .map_err(ResolveError::Store)?;
        if swept > 0 {
            debug!(swept, "Swept expired snapshots");
        }

        if let Some(cached) = self
            .cache
            .find_valid(city_name, now)
            .await
            .map_err(ResolveError::Store)?
        {
            drop(guard);
            info!(snapshot_id = cached.id, "Cache hit");

            let payload = serde_json::to_value(&cached)
                .map_err(|e| ResolveError::Store(AppError::internal(e.to_string())))?;
            self.provenance
                .record_best_effort(
                    user_id,
                    city_name,
                    cached.coordinates(),
                    CACHE_HIT_MARKER,
                    payload,
                )
                .await;

            return Ok(cached);
        }

        info!("Cache miss");

        let coordinates = self.geocode(city_name).await?;

        let forecast = self
            .forecast
            .fetch(coordinates)
            .await
            .map_err(ResolveError::Upstream)?;

        if !forecast.has_current() {
            warn!(url = %forecast.url, "Forecast response has no current conditions");
            return Err(ResolveError::WeatherUnavailable);
        }

        let snapshot =
            NewSnapshot::from_forecast(city_name, coordinates, &forecast.payload, Utc::now())
                .ok_or_else(|| {
                    warn!(url = %forecast.url, "Forecast current conditions are incomplete");
                    ResolveError::WeatherUnavailable
                })?;

        let stored = self
            .cache
            .insert(snapshot)
            .await
            .map_err(ResolveError::Store)?;
        drop(guard);

        info!(snapshot_id = stored.id, "Cached fresh snapshot");

        self.provenance
            .record_best_effort(
                user_id,
                city_name,
                coordinates,
                &forecast.url,
                forecast.payload,
            )
            .await;

        Ok(stored)
    }

    /// Coordinates for `city_name` straight from the geocoder, bypassing the
    /// weather cache and the provenance trail.
    pub async fn locate(&self, city_name: &str) -> Result<Coordinates, ResolveError> {
        validate_city_name(city_name)?;
        self.geocode(city_name).await
    }

    async fn geocode(&self, city_name: &str) -> Result<Coordinates, ResolveError> {
        let candidates = self
            .geocoder
            .search(city_name)
            .await
            .map_err(ResolveError::Upstream)?;

        // The last candidate wins when the geocoder returns several
        candidates
            .last()
            .map(GeoCandidate::coordinates)
            .ok_or(ResolveError::CityNotFound)
    }

    pub async fn clear_cache(&self) -> Result<u64, AppError> {
        let removed = self.cache.delete_all().await?;
        info!(removed, "Cache cleared");
        Ok(removed)
    }

    pub async fn clear_city(&self, city_name: &str) -> Result<u64, AppError> {
        let removed = self.cache.delete_for_city(city_name).await?;
        info!(city = %city_name, removed, "City cache cleared");
        Ok(removed)
    }
}
