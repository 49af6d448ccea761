//! Request body validation. Fields are trimmed before they are checked.

use crate::error::AppError;
use crate::models::{UserCreate, UserUpdate};
use regex::Regex;
use std::sync::OnceLock;

pub const MAX_TEXT_LENGTH: usize = 255;
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

pub trait Validate {
    /// Trim string fields in place.
    fn normalize(&mut self);

    fn validate(&self) -> Result<(), AppError>;

    fn into_valid(mut self) -> Result<Self, AppError>
    where
        Self: Sized,
    {
        self.normalize();
        self.validate()?;
        Ok(self)
    }
}

fn email_regex() -> Result<&'static Regex, AppError> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = EMAIL.get() {
        return Ok(re);
    }
    let re = Regex::new(EMAIL_PATTERN).map_err(|e| AppError::Internal(format!("invalid email pattern: {}", e)))?;
    Ok(EMAIL.get_or_init(|| re))
}

fn trim(s: &mut String) {
    let trimmed = s.trim();
    if trimmed.len() != s.len() {
        *s = trimmed.to_string();
    }
}

fn check_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > MAX_TEXT_LENGTH {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_TEXT_LENGTH
        )));
    }
    Ok(())
}

fn check_email(field: &str, value: &str) -> Result<(), AppError> {
    check_text(field, value)?;
    if !email_regex()?.is_match(value) {
        return Err(AppError::Validation(format!("{} must be a valid email", field)));
    }
    Ok(())
}

impl Validate for UserCreate {
    fn normalize(&mut self) {
        trim(&mut self.first_name);
        trim(&mut self.last_name);
        trim(&mut self.username);
        trim(&mut self.email);
    }

    fn validate(&self) -> Result<(), AppError> {
        check_text("firstName", &self.first_name)?;
        check_text("lastName", &self.last_name)?;
        check_text("username", &self.username)?;
        check_email("email", &self.email)
    }
}

/// Only present fields are checked.
impl Validate for UserUpdate {
    fn normalize(&mut self) {
        for field in [
            &mut self.first_name,
            &mut self.last_name,
            &mut self.username,
            &mut self.email,
        ]
        .into_iter()
        .flatten()
        {
            trim(field);
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        if let Some(v) = &self.first_name {
            check_text("firstName", v)?;
        }
        if let Some(v) = &self.last_name {
            check_text("lastName", v)?;
        }
        if let Some(v) = &self.username {
            check_text("username", v)?;
        }
        if let Some(v) = &self.email {
            check_email("email", v)?;
        }
        Ok(())
    }
}
