mod support;

use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;
use support::{TestApp, delete, forecast, get, json_body, london, put, token};
use uuid::Uuid;
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn test_health() {
    let app = TestApp::start().await;

    let response = app.request(get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn test_weather_returns_cache_shaped_json() {
    let app = TestApp::start().await;
    app.mount_geocoding("London", london(), 1).await;
    app.mount_forecast(forecast(15.0), 1).await;

    let response = app.request(get("/weather/London", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let object = body.as_object().expect("object body");
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "cached_at",
            "city_name",
            "expiry_time",
            "forecast_data",
            "humidity",
            "latitude",
            "longitude",
            "temperature",
            "wind_speed",
        ]
    );
    assert_eq!(body["city_name"], "London");
    assert_eq!(body["temperature"], 15.0);
}

#[tokio::test]
async fn test_percent_encoded_city_is_decoded() {
    let app = TestApp::start().await;
    app.mount_geocoding(
        "New York",
        json!([{ "name": "New York", "lat": 40.71, "lon": -74.01 }]),
        1,
    )
    .await;
    app.mount_forecast(forecast(9.0), 1).await;

    let response = app.request(get("/weather/New%20York", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["city_name"], "New York");
}

#[tokio::test]
async fn test_unknown_city_is_404() {
    let app = TestApp::start().await;
    app.mount_geocoding("Nowhereistan", json!([]), 1).await;

    let response = app.request(get("/weather/Nowhereistan", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({ "error": "City not found" }));
}

#[tokio::test]
async fn test_too_long_city_is_404() {
    let app = TestApp::start().await;

    let response = app
        .request(get(&format!("/weather/{}", "a".repeat(100)), None))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({ "error": "City not found" }));
}

#[tokio::test]
async fn test_missing_weather_is_404() {
    let app = TestApp::start().await;
    app.mount_geocoding("London", london(), 1).await;
    app.mount_forecast(json!({ "latitude": 51.5 }), 1).await;

    let response = app.request(get("/weather/London", None)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Weather data not available" })
    );
}

#[tokio::test]
async fn test_forecast_outage_is_502() {
    let app = TestApp::start().await;
    app.mount_geocoding("London", london(), 1).await;
    Mock::given(method("GET"))
        .and(path(support::FORECAST_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let response = app.request(get("/weather/London", None)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Upstream service failure" })
    );
}

#[tokio::test]
async fn test_geocoder_outage_body_does_not_leak_api_key() {
    let app = TestApp::start().await;
    Mock::given(method("GET"))
        .and(path(support::GEOCODING_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.upstream)
        .await;

    let response = app.request(get("/weather/London", None)).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(!body.to_string().contains("test-key"));
    assert_eq!(body, json!({ "error": "Upstream service failure" }));
}

#[tokio::test]
async fn test_geocoder_timeout_is_504_without_api_key() {
    let app = TestApp::start().await;
    Mock::given(method("GET"))
        .and(path(support::GEOCODING_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(london())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&app.upstream)
        .await;

    let response = app.request(get("/weather/London", None)).await;

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = json_body(response).await;
    assert!(!body.to_string().contains("test-key"));
    assert_eq!(body, json!({ "error": "Upstream service timed out" }));
}

#[tokio::test]
async fn test_invalid_token_on_weather_is_401() {
    let app = TestApp::start().await;

    let response = app.request(get("/weather/London", Some("garbage"))).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_clear_cache_requires_admin() {
    let app = TestApp::start().await;

    let anonymous = app.request(delete("/admin/cache/", None)).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let user = token(Uuid::new_v4(), "user");
    let forbidden = app.request(delete("/admin/cache/", Some(&user))).await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let admin = token(Uuid::new_v4(), "admin");
    let cleared = app.request(delete("/admin/cache/", Some(&admin))).await;
    assert_eq!(cleared.status(), StatusCode::OK);
    assert_eq!(json_body(cleared).await, json!({ "message": "Cache cleared" }));
}

#[tokio::test]
async fn test_clear_city_cache_forces_refetch() {
    let app = TestApp::start().await;
    app.mount_geocoding("London", london(), 2).await;
    app.mount_forecast(forecast(15.0), 2).await;
    let admin = token(Uuid::new_v4(), "admin");

    assert_eq!(
        app.request(get("/weather/London", None)).await.status(),
        StatusCode::OK
    );

    let cleared = app.request(delete("/admin/cache/London", Some(&admin))).await;
    assert_eq!(cleared.status(), StatusCode::OK);
    assert_eq!(
        json_body(cleared).await,
        json!({ "message": "Cache for London cleared" })
    );

    assert_eq!(
        app.request(get("/weather/London", None)).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_history_follows_authenticated_lookups() {
    let app = TestApp::start().await;
    app.mount_geocoding("London", london(), 1).await;
    app.mount_forecast(forecast(15.0), 1).await;
    let user = token(Uuid::new_v4(), "user");

    let unauthenticated = app.request(get("/history", None)).await;
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    for _ in 0..2 {
        let response = app.request(get("/weather/London", Some(&user))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let history = json_body(app.request(get("/history", Some(&user))).await).await;
    let entries = history.as_array().expect("array body");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["city_name"], "London");

    let removed = app.request(delete("/history/London", Some(&user))).await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let missing = app.request(delete("/history/London", Some(&user))).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_saved_cities_are_geocoded_without_touching_the_cache() {
    let app = TestApp::start().await;
    app.mount_geocoding("London", london(), 1).await;
    app.mount_geocoding("Atlantis", json!([]), 1).await;
    app.mount_forecast(forecast(15.0), 0).await;
    let user = token(Uuid::new_v4(), "user");

    let unauthenticated = app.request(put("/saved-cities/London", None)).await;
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let saved = app.request(put("/saved-cities/London", Some(&user))).await;
    assert_eq!(saved.status(), StatusCode::OK);
    let body = json_body(saved).await;
    assert_eq!(body["city_name"], "London");
    assert_eq!(body["latitude"], 51.5);
    assert!(body.get("user_id").is_none());

    let unknown = app.request(put("/saved-cities/Atlantis", Some(&user))).await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(unknown).await, json!({ "error": "City not found" }));

    assert!(app.store.snapshots().await.is_empty());
    assert!(app.store.request_logs().await.is_empty());

    let other_user = token(Uuid::new_v4(), "user");
    let others = json_body(app.request(get("/saved-cities", Some(&other_user))).await).await;
    assert_eq!(others, json!([]));

    let listed = json_body(app.request(get("/saved-cities", Some(&user))).await).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));

    let removed = app.request(delete("/saved-cities/London", Some(&user))).await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);

    let missing = app.request(delete("/saved-cities/London", Some(&user))).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = TestApp::start().await;

    let response = app.request(get("/api-docs/openapi.json", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let doc = json_body(response).await;
    assert!(doc["paths"]["/weather/{city}"].is_object());
    assert!(doc["paths"]["/saved-cities/{city}"]["put"].is_object());
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());
}
