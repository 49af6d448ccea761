//! OpenAPI document for the `/v1` API, served at `/v1/swagger.json`.

use crate::handlers::user;
use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Boilerplate API", description = "Layered CRUD service over PostgreSQL"),
    paths(user::list, user::read, user::create, user::update, user::delete),
    tags((name = "users", description = "User management"))
)]
pub struct ApiDoc;

async fn swagger_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Relative to the `/v1` nest.
pub fn openapi_routes() -> Router {
    Router::new().route("/swagger.json", get(swagger_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_user_routes() {
        let doc = serde_json::to_value(ApiDoc::openapi()).expect("serialize");
        let paths = doc["paths"].as_object().expect("paths");
        assert!(paths.contains_key("/v1/users"));
        assert!(paths.contains_key("/v1/users/{id}"));
        assert!(doc["paths"]["/v1/users/{id}"]["patch"].is_object());
    }
}
