use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::{LocationHistoryEntry, SavedCity, WeatherSnapshot};
use common::errors::ErrorResponse;
use common::models::MessageResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::get_weather,
        handlers::list_history,
        handlers::delete_history,
        handlers::list_saved_cities,
        handlers::save_city,
        handlers::delete_saved_city,
        handlers::clear_cache,
        handlers::clear_city_cache,
    ),
    components(schemas(
        WeatherSnapshot,
        LocationHistoryEntry,
        SavedCity,
        MessageResponse,
        ErrorResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "weather", description = "Cached weather lookup by city"),
        (name = "history", description = "Per-user location search history"),
        (name = "saved-cities", description = "Per-user saved cities"),
        (name = "admin", description = "Cache administration"),
    ),
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
