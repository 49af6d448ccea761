//! `/v1/users` handlers.

use super::{parse_body, parse_id, ListParams};
use crate::error::{AppError, ErrorBody};
use crate::extractors::ActorId;
use crate::models::{User, UserCreate, UserUpdate};
use crate::response::{success_created, success_one, success_page, SuccessOne, SuccessPage};
use crate::service::{UserService, Validate};
use crate::session::RequestSession;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "users",
    summary = "List users",
    params(
        ("pageNumber" = Option<u64>, Query, description = "1-based page number (default 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default 10)"),
        ("omitPagination" = Option<bool>, Query, description = "Return every match"),
        ("sortBy" = Option<String>, Query, description = "camelCase field name (default createdDate)"),
        ("sortDirection" = Option<String>, Query, description = "ascending | descending"),
        ("isActive" = Option<bool>, Query, description = "Filter on the active flag"),
    ),
    responses(
        (status = 200, description = "One page of users", body = SuccessPage<User>),
        (status = 400, description = "Invalid query parameter", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody),
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let params = ListParams::parse(&params)?;
    let mut session = RequestSession::begin(&state.pool).await?;
    let result = UserService::for_connection(session.conn(), &state.schema)
        .list_users(params.page, params.is_active)
        .await;
    let page = session.close(result).await?;
    Ok(success_page(page))
}

#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = uuid::Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = SuccessOne<User>),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "No active user with this id", body = ErrorBody),
    )
)]
pub async fn read(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let mut session = RequestSession::begin(&state.pool).await?;
    let result = UserService::for_connection(session.conn(), &state.schema).get_by_id(id).await;
    let user = session.close(result).await?;
    Ok(success_one(user))
}

#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    params(("X-User-Id" = Option<String>, Header, description = "Acting user id (default system)")),
    responses(
        (status = 201, description = "Created", body = SuccessOne<User>),
        (status = 400, description = "Invalid body", body = ErrorBody),
        (status = 409, description = "Username or email already in use", body = ErrorBody),
    )
)]
pub async fn create(
    State(state): State<AppState>,
    actor: ActorId,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let model = parse_body::<UserCreate>(body)?.into_valid()?;
    let mut session = RequestSession::begin(&state.pool).await?;
    let result = UserService::for_connection(session.conn(), &state.schema)
        .create(model, actor.as_str())
        .await;
    let user = session.close(result).await?;
    tracing::info!(id = %user.id, actor = actor.as_str(), "user created");
    Ok(success_created(user))
}

#[utoipa::path(
    patch,
    path = "/v1/users/{id}",
    tag = "users",
    summary = "Update user",
    description = "Only the fields present in the body are changed.",
    request_body = UserUpdate,
    params(
        ("id" = uuid::Uuid, Path, description = "User id"),
        ("X-User-Id" = Option<String>, Header, description = "Acting user id (default system)"),
    ),
    responses(
        (status = 200, description = "Updated user", body = SuccessOne<User>),
        (status = 400, description = "Invalid id or body", body = ErrorBody),
        (status = 404, description = "No active user with this id", body = ErrorBody),
        (status = 409, description = "Username or email already in use", body = ErrorBody),
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: ActorId,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let model = parse_body::<UserUpdate>(body)?.into_valid()?;
    let mut session = RequestSession::begin(&state.pool).await?;
    let result = UserService::for_connection(session.conn(), &state.schema)
        .update(id, model, actor.as_str())
        .await;
    let user = session.close(result).await?;
    Ok(success_one(user))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    tag = "users",
    summary = "Delete user",
    description = "Soft delete: the row is kept with isActive = false.",
    params(
        ("id" = uuid::Uuid, Path, description = "User id"),
        ("X-User-Id" = Option<String>, Header, description = "Acting user id (default system)"),
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "No active user with this id", body = ErrorBody),
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    actor: ActorId,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    let mut session = RequestSession::begin(&state.pool).await?;
    let result = UserService::for_connection(session.conn(), &state.schema)
        .delete(id, actor.as_str())
        .await;
    session.close(result).await?;
    Ok(StatusCode::NO_CONTENT)
}
