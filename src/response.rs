//! Standard response envelope helpers.

use crate::models::Page;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct SuccessOne<T> {
    pub data: T,
}

#[derive(Serialize, ToSchema)]
pub struct SuccessPage<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// `count` is the number of items in this response, `total` the number of matches.
#[derive(Serialize, ToSchema)]
pub struct PageMeta {
    pub count: u64,
    pub total: u64,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data }))
}

pub fn success_created<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data }))
}

pub fn success_page<T: Serialize>(page: Page<T>) -> (StatusCode, Json<SuccessPage<T>>) {
    let count = page.items.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessPage {
            data: page.items,
            meta: PageMeta {
                count,
                total: page.total,
            },
        }),
    )
}
