use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use common::errors::AppError;
use common::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::AppState;

fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| AppError::auth("Invalid Authorization header format"))?;

    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| AppError::auth("Invalid Authorization header format"))
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| AppError::auth(format!("Invalid token: {}", e)))?;

    Ok(token_data.claims)
}

/// Validate a bearer token when one is sent. Requests without an
/// Authorization header pass through anonymously; a bad token is rejected.
pub async fn optional_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(&headers)? {
        let claims = decode_claims(token, &state.jwt_secret)?;
        request.extensions_mut().insert(claims);
    }

    Ok(next.run(request).await)
}

/// Middleware to validate JWT token and extract claims
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token =
        bearer_token(&headers)?.ok_or_else(|| AppError::auth("Missing Authorization header"))?;

    let claims = decode_claims(token, &state.jwt_secret)?;

    // Insert claims into request extensions for handlers to access
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Middleware to require admin role
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::authorization("No claims found in request"))?;

    if !claims.is_admin() {
        return Err(AppError::authorization(
            "Admin role required for this endpoint",
        ));
    }

    Ok(next.run(request).await)
}
