use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use common::errors::AppError;
use common::models::{Claims, MessageResponse};
use chrono::Utc;
use tracing::info;

use crate::AppState;
use crate::models::{LocationHistoryEntry, SavedCity, WeatherSnapshot};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check")
    )
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "service": "weather-gateway" }))
}

#[utoipa::path(
    get,
    path = "/weather/{city}",
    params(
        ("city" = String, Path, description = "City name, matched exactly")
    ),
    responses(
        (status = 200, description = "Current weather and hourly forecast", body = WeatherSnapshot),
        (status = 401, description = "Invalid bearer token", body = common::errors::ErrorResponse),
        (status = 404, description = "City not found or weather unavailable", body = common::errors::ErrorResponse),
        (status = 502, description = "Upstream service failure", body = common::errors::ErrorResponse),
        (status = 504, description = "Upstream service timed out", body = common::errors::ErrorResponse)
    ),
    security((), ("bearer_auth" = [])),
    tag = "weather"
)]
pub async fn get_weather(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(city): Path<String>,
) -> Result<Json<WeatherSnapshot>, AppError> {
    let user_id = claims
        .map(|Extension(claims)| claims.user_id())
        .transpose()?;

    info!(city = %city, user = ?user_id, "Weather request received");

    let snapshot = state.orchestrator.resolve(&city, user_id).await?;

    Ok(Json(snapshot))
}

#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "Caller's location history, newest first", body = Vec<LocationHistoryEntry>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "history"
)]
pub async fn list_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<LocationHistoryEntry>>, AppError> {
    let user_id = claims.user_id()?;

    let entries = state.history.list_history(user_id).await?;

    Ok(Json(entries))
}

#[utoipa::path(
    delete,
    path = "/history/{city}",
    params(
        ("city" = String, Path, description = "City name")
    ),
    responses(
        (status = 204, description = "History entry deleted"),
        (status = 404, description = "No history entry for this city"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "history"
)]
pub async fn delete_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(city): Path<String>,
) -> Result<StatusCode, AppError> {
    let user_id = claims.user_id()?;

    if state.history.delete_history(user_id, &city).await? {
        info!(user_id = %user_id, city = %city, "History entry deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("History entry not found"))
    }
}

#[utoipa::path(
    get,
    path = "/saved-cities",
    responses(
        (status = 200, description = "Caller's saved cities, oldest first", body = Vec<SavedCity>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "saved-cities"
)]
pub async fn list_saved_cities(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<SavedCity>>, AppError> {
    let user_id = claims.user_id()?;

    let cities = state.saved_cities.list_saved(user_id).await?;

    Ok(Json(cities))
}

#[utoipa::path(
    put,
    path = "/saved-cities/{city}",
    params(
        ("city" = String, Path, description = "City name, geocoded to fix its coordinates")
    ),
    responses(
        (status = 200, description = "City saved", body = SavedCity),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "City not found", body = common::errors::ErrorResponse),
        (status = 502, description = "Upstream service failure", body = common::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "saved-cities"
)]
pub async fn save_city(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(city): Path<String>,
) -> Result<Json<SavedCity>, AppError> {
    let user_id = claims.user_id()?;

    let coordinates = state.orchestrator.locate(&city).await?;

    let saved = state
        .saved_cities
        .save_city(SavedCity {
            user_id,
            city_name: city,
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            saved_at: Utc::now(),
        })
        .await?;

    info!(user_id = %user_id, city = %saved.city_name, "City saved");

    Ok(Json(saved))
}

#[utoipa::path(
    delete,
    path = "/saved-cities/{city}",
    params(
        ("city" = String, Path, description = "City name")
    ),
    responses(
        (status = 204, description = "Saved city removed"),
        (status = 404, description = "City is not saved"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "saved-cities"
)]
pub async fn delete_saved_city(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(city): Path<String>,
) -> Result<StatusCode, AppError> {
    let user_id = claims.user_id()?;

    if state.saved_cities.delete_saved(user_id, &city).await? {
        info!(user_id = %user_id, city = %city, "Saved city removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Saved city not found"))
    }
}

#[utoipa::path(
    delete,
    path = "/admin/cache/",
    responses(
        (status = 200, description = "Cache cleared", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn clear_cache(State(state): State<AppState>) -> Result<Json<MessageResponse>, AppError> {
    state.orchestrator.clear_cache().await?;

    Ok(Json(MessageResponse::new("Cache cleared")))
}

#[utoipa::path(
    delete,
    path = "/admin/cache/{city}",
    params(
        ("city" = String, Path, description = "City name, matched exactly")
    ),
    responses(
        (status = 200, description = "Cache for the city cleared", body = MessageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "admin"
)]
pub async fn clear_city_cache(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.orchestrator.clear_city(&city).await?;

    Ok(Json(MessageResponse::new(format!(
        "Cache for {} cleared",
        city
    ))))
}
