//! Router assembly.

mod common;
mod user;

pub use common::common_routes;
pub use user::user_routes;

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::openapi::openapi_routes;
use crate::state::AppState;
use axum::http::{HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const API_PREFIX: &str = "/v1";

/// CORS for a comma-separated list of origins, any method and header.
pub fn cors_layer(allowed_origins: &str) -> Result<CorsLayer, ConfigError> {
    let origins = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            HeaderValue::from_str(o).map_err(|_| ConfigError::InvalidValue {
                key: "CORS_ALLOWED_ORIGIN",
                value: o.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any))
}

/// Full application: operational routes, `/v1` API, OpenAPI document,
/// request tracing and CORS.
pub fn app_router(state: AppState, config: &AppConfig) -> Result<Router, ConfigError> {
    let api = user_routes(state.clone()).merge(openapi_routes());
    Ok(Router::new()
        .merge(common_routes(state))
        .nest(API_PREFIX, api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors_allowed_origin)?),
        ))
}
