pub mod config;
pub mod forecast;
pub mod geocoding;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod orchestrator;
pub mod provenance;
pub mod single_flight;
pub mod store;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, put},
};
use common::errors::AppError;
use common::http_client::HttpClient;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::forecast::ForecastClient;
use crate::geocoding::GeocodingClient;
use crate::orchestrator::WeatherOrchestrator;
use crate::provenance::ProvenanceRecorder;
use crate::store::{CacheStore, ProvenanceStore, SavedCityStore};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<WeatherOrchestrator>,
    pub history: Arc<dyn ProvenanceStore>,
    pub saved_cities: Arc<dyn SavedCityStore>,
    pub jwt_secret: String,
}

impl AppState {
    /// Wire the upstream clients and stores described by `config`
    pub fn build(
        config: &Config,
        cache: Arc<dyn CacheStore>,
        provenance: Arc<dyn ProvenanceStore>,
        saved_cities: Arc<dyn SavedCityStore>,
    ) -> Result<Self, AppError> {
        let http_client = Arc::new(HttpClient::new(
            config.upstream_timeout_secs,
            config.upstream_max_retries,
        )?);

        let geocoder = Arc::new(GeocodingClient::new(
            http_client.clone(),
            config.geocoding_url.clone(),
            config.openweather_api_key.clone(),
        ));
        let forecast = Arc::new(ForecastClient::new(
            http_client,
            config.open_meteo_url.clone(),
        ));

        let orchestrator = Arc::new(WeatherOrchestrator::new(
            geocoder,
            forecast,
            cache,
            ProvenanceRecorder::new(provenance.clone()),
        ));

        Ok(Self {
            orchestrator,
            history: provenance,
            saved_cities,
            jwt_secret: config.jwt_secret.clone(),
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    // Anonymous lookups are allowed; a token only attributes the search
    let weather_routes = Router::new()
        .route("/weather/{city}", get(handlers::get_weather))
        .layer(from_fn_with_state(state.clone(), middleware::optional_auth));

    let user_routes = Router::new()
        .route("/history", get(handlers::list_history))
        .route("/history/{city}", delete(handlers::delete_history))
        .route("/saved-cities", get(handlers::list_saved_cities))
        .route(
            "/saved-cities/{city}",
            put(handlers::save_city).delete(handlers::delete_saved_city),
        )
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    // Admin routes (require JWT + admin role)
    let admin_routes = Router::new()
        .route("/admin/cache", delete(handlers::clear_cache))
        .route("/admin/cache/", delete(handlers::clear_cache))
        .route("/admin/cache/{city}", delete(handlers::clear_city_cache))
        .layer(from_fn(middleware::require_admin))
        .layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(weather_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
