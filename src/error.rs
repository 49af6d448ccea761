//! Typed errors and HTTP mapping.

use crate::models::{ErrorResult, ErrorStatus};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;
use utoipa::ToSchema;

/// Failures raised by the data-access layer. The service layer converts every
/// variant into an [`ErrorResult`]; none of them reach a handler directly.
#[derive(Error, Debug)]
pub enum CrudError {
    #[error("{0}")]
    UniqueViolation(String),
    #[error("{0}")]
    IntegrityViolation(String),
    #[error("invalid sort field: {0}")]
    InvalidSortField(String),
    #[error("invalid filter field: {0}")]
    InvalidFilterField(String),
    #[error("{message}")]
    Database {
        message: String,
        #[source]
        source: sqlx::Error,
    },
}

impl CrudError {
    /// Classify a driver error raised while writing. Unique violations and other
    /// constraint failures get their own variants; everything else is `Database`.
    pub fn from_write(message: String, err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => match db.kind() {
                ErrorKind::UniqueViolation => CrudError::UniqueViolation(message),
                ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                    CrudError::IntegrityViolation(message)
                }
                _ => CrudError::Database { message, source: err },
            },
            _ => CrudError::Database { message, source: err },
        }
    }

    pub fn database(message: String, source: sqlx::Error) -> Self {
        CrudError::Database { message, source }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid schema name: '{0}'")]
    InvalidSchemaName(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl From<ErrorResult> for AppError {
    fn from(err: ErrorResult) -> Self {
        match err.status {
            ErrorStatus::NotFound => AppError::NotFound(err.details),
            ErrorStatus::Conflict => AppError::Conflict(err.details),
            ErrorStatus::BadRequest => AppError::BadRequest(err.details),
            ErrorStatus::InternalError => AppError::Internal(err.details),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        // Internal text stays in the logs.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[rstest]
    #[case(ErrorStatus::NotFound, StatusCode::NOT_FOUND, "not_found")]
    #[case(ErrorStatus::Conflict, StatusCode::CONFLICT, "conflict")]
    #[case(ErrorStatus::BadRequest, StatusCode::BAD_REQUEST, "bad_request")]
    #[case(ErrorStatus::InternalError, StatusCode::INTERNAL_SERVER_ERROR, "internal_error")]
    #[tokio::test]
    async fn error_result_maps_to_http_status(
        #[case] status: ErrorStatus,
        #[case] expected: StatusCode,
        #[case] code: &str,
    ) {
        let response = AppError::from(ErrorResult::new(status, "boom")).into_response();
        assert_eq!(response.status(), expected);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], code);
    }

    #[tokio::test]
    async fn client_errors_keep_their_message() {
        let response = AppError::Conflict("User with given username or email already exists".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "User with given username or email already exists");
    }

    #[tokio::test]
    async fn server_errors_hide_internal_text() {
        let response = AppError::Internal("Failed to retrieve User with id 42: pool timed out".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Internal Server Error");
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn non_database_driver_errors_are_not_constraint_failures() {
        let err = CrudError::from_write("Failed to create new entity User".into(), sqlx::Error::PoolTimedOut);
        assert!(matches!(err, CrudError::Database { .. }));
        assert_eq!(err.to_string(), "Failed to create new entity User");
    }
}
