use crate::handlers::user::{create, delete, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

/// `/users` and `/users/:id`; mounted under `/v1`.
pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/:id", get(read).patch(update).delete(delete))
        .with_state(state)
}
