use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure category of a service call. Handlers map each one to an HTTP status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorStatus {
    NotFound,
    BadRequest,
    Conflict,
    InternalError,
}

/// Failure payload returned by services in place of a raised error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub status: ErrorStatus,
    pub details: String,
}

impl ErrorResult {
    pub fn new(status: ErrorStatus, details: impl Into<String>) -> Self {
        ErrorResult {
            status,
            details: details.into(),
        }
    }

    pub fn not_found(details: impl Into<String>) -> Self {
        Self::new(ErrorStatus::NotFound, details)
    }

    pub fn conflict(details: impl Into<String>) -> Self {
        Self::new(ErrorStatus::Conflict, details)
    }

    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::new(ErrorStatus::BadRequest, details)
    }

    pub fn internal(details: impl Into<String>) -> Self {
        Self::new(ErrorStatus::InternalError, details)
    }
}

impl fmt::Display for ErrorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.status, self.details)
    }
}

/// Return type of every service operation.
pub type ServiceResult<T> = Result<T, ErrorResult>;
