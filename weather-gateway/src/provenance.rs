use chrono::Utc;
use common::errors::AppError;
use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::models::{Coordinates, LocationHistoryEntry, NewRequestLog};
use crate::store::ProvenanceStore;

/// Status recorded for every successful resolution
const RESOLVED_STATUS: i32 = 200;

/// Writes the search history and the request log for each resolution
pub struct ProvenanceRecorder {
    store: Arc<dyn ProvenanceStore>,
}

impl ProvenanceRecorder {
    pub fn new(store: Arc<dyn ProvenanceStore>) -> Self {
        Self { store }
    }

    /// Replace the user's history entry for `city_name` and append a request
    /// log. Anonymous callers get a log entry only. The two writes are not
    /// transactional.
    #[instrument(skip(self, payload), fields(city = %city_name, user = ?user_id))]
    pub async fn record_resolution(
        &self,
        user_id: Option<Uuid>,
        city_name: &str,
        coordinates: Coordinates,
        request_url: &str,
        payload: Value,
    ) -> Result<(), AppError> {
        let now = Utc::now();

        if let Some(user_id) = user_id {
            self.store
                .upsert_history(LocationHistoryEntry {
                    user_id,
                    city_name: city_name.to_string(),
                    latitude: coordinates.latitude,
                    longitude: coordinates.longitude,
                    search_time: now,
                })
                .await?;
        }

        self.store
            .append_request_log(NewRequestLog {
                user_id,
                city_name: city_name.to_string(),
                request_url: request_url.to_string(),
                response_status: RESOLVED_STATUS,
                response_data: payload,
                request_time: now,
            })
            .await?;

        Ok(())
    }

    /// Like [`record_resolution`](Self::record_resolution), but failures are
    /// logged instead of returned.
    pub async fn record_best_effort(
        &self,
        user_id: Option<Uuid>,
        city_name: &str,
        coordinates: Coordinates,
        request_url: &str,
        payload: Value,
    ) {
        if let Err(e) = self
            .record_resolution(user_id, city_name, coordinates, request_url, payload)
            .await
        {
            warn!(city = %city_name, error = %e, "Failed to record provenance");
        }
    }
}
