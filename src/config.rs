//! Application configuration read from the environment (after `.env` is loaded).

use crate::error::ConfigError;
use std::str::FromStr;

pub const DEFAULT_DATABASE_USERNAME: &str = "db_master_admin";
pub const DEFAULT_DATABASE_PASSWORD: &str = "db_master_admin_password";
pub const DEFAULT_DATABASE_HOSTNAME: &str = "0.0.0.0";
pub const DEFAULT_DATABASE_PORT: u16 = 5432;
pub const DEFAULT_DATABASE_NAME: &str = "app_db";
pub const DEFAULT_DATABASE_SCHEMA: &str = "sample_schema";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub database_schema: String,
    pub max_connections: u32,
    pub bind_addr: String,
    pub cors_allowed_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `DATABASE_URL` wins over the individual parts.
    pub fn from_env_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| env(key).filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string());

        let database_url = match env("DATABASE_URL").filter(|v| !v.is_empty()) {
            Some(url) => url,
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                var("DATABASE_USERNAME", DEFAULT_DATABASE_USERNAME),
                var("DATABASE_PASSWORD", DEFAULT_DATABASE_PASSWORD),
                var("DATABASE_HOSTNAME", DEFAULT_DATABASE_HOSTNAME),
                parse(&env, "DATABASE_PORT", DEFAULT_DATABASE_PORT)?,
                var("DATABASE_NAME", DEFAULT_DATABASE_NAME),
            ),
        };

        let database_schema = var("DATABASE_SCHEMA", DEFAULT_DATABASE_SCHEMA);
        if !is_identifier(&database_schema) {
            return Err(ConfigError::InvalidSchemaName(database_schema));
        }

        Ok(AppConfig {
            database_url,
            database_schema,
            max_connections: parse(&env, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            bind_addr: var("BIND_ADDR", DEFAULT_BIND_ADDR),
            cors_allowed_origin: var("CORS_ALLOWED_ORIGIN", DEFAULT_CORS_ALLOWED_ORIGIN),
        })
    }
}

fn parse<T: FromStr>(env: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match env(key).filter(|v| !v.is_empty()) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: v }),
        None => Ok(default),
    }
}

/// Plain SQL identifier: a letter or underscore, then letters, digits or underscores.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
