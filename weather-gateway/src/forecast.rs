use common::errors::AppError;
use common::http_client::HttpClient;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::models::Coordinates;

const FORECAST_FIELDS: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m";

/// Raw forecast response and the URL it came from
#[derive(Debug, Clone)]
pub struct ForecastResponse {
    pub url: String,
    pub payload: Value,
}

impl ForecastResponse {
    pub fn has_current(&self) -> bool {
        self.payload.get("current").is_some()
    }
}

/// Client for the Open-Meteo forecast API
pub struct ForecastClient {
    http_client: Arc<HttpClient>,
    base_url: String,
}

impl ForecastClient {
    pub fn new(http_client: Arc<HttpClient>, base_url: String) -> Self {
        Self {
            http_client,
            base_url,
        }
    }

    pub fn forecast_url(&self, coordinates: Coordinates) -> String {
        format!(
            "{}?latitude={}&longitude={}&current={}&hourly={}",
            self.base_url,
            coordinates.latitude,
            coordinates.longitude,
            FORECAST_FIELDS,
            FORECAST_FIELDS
        )
    }

    /// Current conditions plus the hourly window. The payload is kept as-is
    /// so it can be logged verbatim.
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    pub async fn fetch(&self, coordinates: Coordinates) -> Result<ForecastResponse, AppError> {
        let url = self.forecast_url(coordinates);

        info!("Fetching forecast from API");

        let payload: Value = self.http_client.get_json(&url).await?;

        Ok(ForecastResponse { url, payload })
    }
}
