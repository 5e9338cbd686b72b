use common::errors::AppError;
use common::http_client::HttpClient;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::Coordinates;

/// One match from the direct geocoding endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GeoCandidate {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl GeoCandidate {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.lat,
            longitude: self.lon,
        }
    }
}

/// Client for the OpenWeather direct geocoding API
pub struct GeocodingClient {
    http_client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
}

impl GeocodingClient {
    pub fn new(http_client: Arc<HttpClient>, base_url: String, api_key: String) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
        }
    }

    /// Candidates for a free-text city name, in upstream order. Empty when
    /// nothing matched.
    #[instrument(skip(self), fields(city = %city))]
    pub async fn search(&self, city: &str) -> Result<Vec<GeoCandidate>, AppError> {
        let query = [("q", city), ("appid", self.api_key.as_str())];
        let candidates: Vec<GeoCandidate> = self
            .http_client
            .get_json_with_query(&self.base_url, &query)
            .await?;

        info!(matches = candidates.len(), "Geocoding completed");

        Ok(candidates)
    }
}
