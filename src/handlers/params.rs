//! List query parameters (`?pageNumber=2&pageSize=20&sortBy=lastName`).

use crate::error::AppError;
use crate::models::{PageRequest, SortDirection, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE};
use std::collections::HashMap;
use std::num::IntErrorKind;

#[derive(Clone, Debug)]
pub struct ListParams {
    pub page: PageRequest,
    pub is_active: Option<bool>,
}

fn parse_positive(key: &str, v: &str) -> Result<u64, AppError> {
    match v.trim().parse::<u64>() {
        Ok(n) if n >= 1 => Ok(n),
        // Past u64 the page is beyond every row, or the size covers all of them.
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(u64::MAX),
        _ => Err(AppError::BadRequest(format!("{} must be an integer >= 1", key))),
    }
}

fn parse_bool(key: &str, v: &str) -> Result<bool, AppError> {
    match v.trim().to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::BadRequest(format!("{} must be true or false", key))),
    }
}

impl ListParams {
    /// Unknown keys are ignored.
    pub fn parse(params: &HashMap<String, String>) -> Result<Self, AppError> {
        let mut page = PageRequest::new(DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE);
        let mut is_active = None;

        for (k, v) in params {
            match k.as_str() {
                "pageNumber" => page.page_number = parse_positive(k, v)?,
                "pageSize" => page.page_size = parse_positive(k, v)?,
                "omitPagination" => page.omit_pagination = parse_bool(k, v)?,
                "sortBy" => {
                    let field = v.trim();
                    if !field.is_empty() {
                        page.sort_by = Some(field.to_string());
                    }
                }
                "sortDirection" => {
                    page.sort_direction = v.trim().parse::<SortDirection>().map_err(AppError::BadRequest)?
                }
                "isActive" => is_active = Some(parse_bool(k, v)?),
                _ => {}
            }
        }
        Ok(ListParams { page, is_active })
    }
}
