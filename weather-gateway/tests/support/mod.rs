#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, header::AUTHORIZATION};
use common::models::Claims;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;
use weather_gateway::config::Config;
use weather_gateway::store::memory::MemoryStore;
use weather_gateway::{AppState, create_router};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

pub const JWT_SECRET: &str = "test-secret";
pub const GEOCODING_PATH: &str = "/geo/1.0/direct";
pub const FORECAST_PATH: &str = "/v1/forecast";

/// Gateway wired to a mock upstream and an in-memory store
pub struct TestApp {
    pub upstream: MockServer,
    pub store: MemoryStore,
    pub state: AppState,
}

impl TestApp {
    pub async fn start() -> Self {
        let upstream = MockServer::start().await;

        let config = Config {
            port: 0,
            database_url: None,
            jwt_secret: JWT_SECRET.to_string(),
            geocoding_url: format!("{}{}", upstream.uri(), GEOCODING_PATH),
            openweather_api_key: "test-key".to_string(),
            open_meteo_url: format!("{}{}", upstream.uri(), FORECAST_PATH),
            upstream_timeout_secs: 2,
            upstream_max_retries: 0,
            log_format: "pretty".to_string(),
        };

        let store = MemoryStore::new();
        let state = AppState::build(
            &config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
        )
        .expect("state should build");

        Self {
            upstream,
            store,
            state,
        }
    }

    /// Geocoding answer for `city`, expected to be requested `calls` times
    pub async fn mount_geocoding(&self, city: &str, candidates: Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path(GEOCODING_PATH))
            .and(query_param("q", city))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidates))
            .expect(calls)
            .mount(&self.upstream)
            .await;
    }

    /// Forecast answer for any coordinates, expected `calls` times
    pub async fn mount_forecast(&self, payload: Value, calls: u64) {
        Mock::given(method("GET"))
            .and(path(FORECAST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload))
            .expect(calls)
            .mount(&self.upstream)
            .await;
    }

    /// Forecast answer that arrives after `delay`
    pub async fn mount_slow_forecast(&self, payload: Value, delay: Duration, calls: u64) {
        Mock::given(method("GET"))
            .and(path(FORECAST_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(payload)
                    .set_delay(delay),
            )
            .expect(calls)
            .mount(&self.upstream)
            .await;
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        create_router(self.state.clone())
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

pub fn london() -> Value {
    json!([{ "name": "London", "lat": 51.5, "lon": -0.1, "country": "GB" }])
}

pub fn forecast(temperature: f64) -> Value {
    json!({
        "latitude": 51.5,
        "longitude": -0.1,
        "current": {
            "time": "2024-01-01T12:00",
            "temperature_2m": temperature,
            "relative_humidity_2m": 81,
            "wind_speed_10m": 13.4
        },
        "hourly": {
            "time": ["2024-01-01T12:00", "2024-01-01T13:00"],
            "temperature_2m": [temperature, temperature + 0.5],
            "relative_humidity_2m": [81, 79],
            "wind_speed_10m": [13.4, 12.9]
        }
    })
}

pub fn token(user_id: Uuid, role: &str) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
        role: role.to_string(),
        permissions: vec![],
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("token should encode")
}

pub fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    build("GET", uri, bearer)
}

pub fn put(uri: &str, bearer: Option<&str>) -> Request<Body> {
    build("PUT", uri, bearer)
}

pub fn delete(uri: &str, bearer: Option<&str>) -> Request<Body> {
    build("DELETE", uri, bearer)
}

fn build(method: &str, uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request should build")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
