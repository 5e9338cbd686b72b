use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Validity window of a cached snapshot, in seconds
pub const CACHE_TTL_SECONDS: i64 = 3600;

/// Longest accepted city name, in characters
pub const MAX_CITY_NAME_CHARS: usize = 99;

/// `request_url` recorded when a resolution was served from cache
pub const CACHE_HIT_MARKER: &str = "cache hit";

/// A point on the globe, as returned by the geocoder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One cached weather result for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct WeatherSnapshot {
    /// Store-assigned, increases with every insert
    #[serde(skip)]
    pub id: i64,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    /// Hourly series exactly as the forecast service returned it
    #[schema(value_type = Object)]
    pub forecast_data: Value,
    pub cached_at: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry_time
    }
}

/// A snapshot that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewSnapshot {
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub forecast_data: Value,
    pub cached_at: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    wind_speed_10m: f64,
}

impl NewSnapshot {
    /// Normalize a raw forecast payload into a cache record.
    ///
    /// Returns `None` when the payload has no usable `current` section.
    /// A missing `hourly` section is stored as an empty object.
    pub fn from_forecast(
        city_name: &str,
        coordinates: Coordinates,
        payload: &Value,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let current: CurrentConditions =
            serde_json::from_value(payload.get("current")?.clone()).ok()?;

        let forecast_data = payload
            .get("hourly")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));

        Some(Self {
            city_name: city_name.to_string(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            temperature: current.temperature_2m,
            humidity: current.relative_humidity_2m,
            wind_speed: current.wind_speed_10m,
            forecast_data,
            cached_at: now,
            expiry_time: now + Duration::seconds(CACHE_TTL_SECONDS),
        })
    }

    pub fn into_snapshot(self, id: i64) -> WeatherSnapshot {
        WeatherSnapshot {
            id,
            city_name: self.city_name,
            latitude: self.latitude,
            longitude: self.longitude,
            temperature: self.temperature,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            forecast_data: self.forecast_data,
            cached_at: self.cached_at,
            expiry_time: self.expiry_time,
        }
    }
}

/// Last search of one city by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct LocationHistoryEntry {
    #[serde(skip)]
    pub user_id: Uuid,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub search_time: DateTime<Utc>,
}

/// A city a user pinned for quick access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct SavedCity {
    #[serde(skip)]
    pub user_id: Uuid,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub saved_at: DateTime<Utc>,
}

/// Audit record of one weather resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct ApiRequestLog {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub city_name: String,
    pub request_url: String,
    pub response_status: i32,
    #[schema(value_type = Object)]
    pub response_data: Value,
    pub request_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRequestLog {
    pub user_id: Option<Uuid>,
    pub city_name: String,
    pub request_url: String,
    pub response_status: i32,
    pub response_data: Value,
    pub request_time: DateTime<Utc>,
}
