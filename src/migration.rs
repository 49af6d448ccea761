//! Schema bootstrap: database, schema, entity tables and indexes. Every
//! statement is idempotent, so it runs on each start.

use crate::config::is_identifier;
use crate::entity::{Entity, UserEntity};
use crate::error::{AppError, ConfigError};
use crate::sql::quoted;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection, PgConnection, PgPool};
use std::str::FromStr;

/// DDL for `schema`, in execution order.
pub fn schema_statements(schema: &str) -> Vec<String> {
    let s = quoted(schema);
    let user = format!("{}.{}", s, quoted(UserEntity::TABLE));
    vec![
        format!("CREATE SCHEMA IF NOT EXISTS {}", s),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             \"id\" uuid PRIMARY KEY, \
             \"created_date\" timestamptz NOT NULL, \
             \"last_modified_date\" timestamptz NOT NULL, \
             \"created_by_user_id\" text NOT NULL, \
             \"last_modified_by_user_id\" text NOT NULL, \
             \"is_active\" boolean NOT NULL DEFAULT TRUE, \
             \"first_name\" text NOT NULL, \
             \"last_name\" text NOT NULL, \
             \"username\" text NOT NULL, \
             \"email\" text NOT NULL)",
            user
        ),
        // Uniqueness holds among active rows only; soft-deleted keys can be reused.
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS \"ix_user_username_active\" ON {} (\"username\") WHERE \"is_active\"",
            user
        ),
        format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS \"ix_user_email_active\" ON {} (\"email\") WHERE \"is_active\"",
            user
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS \"ix_user_created_date\" ON {} (\"created_date\", \"id\")",
            user
        ),
    ]
}

/// Run the DDL on an existing connection (the caller owns the transaction).
pub async fn apply_schema(conn: &mut PgConnection, schema: &str) -> Result<(), AppError> {
    if !is_identifier(schema) {
        return Err(ConfigError::InvalidSchemaName(schema.to_string()).into());
    }
    for sql in schema_statements(schema) {
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(&sql).execute(&mut *conn).await?;
    }
    Ok(())
}

pub async fn apply_migrations(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    apply_schema(&mut tx, schema).await?;
    tx.commit().await?;
    tracing::info!(schema, "schema is up to date");
    Ok(())
}

/// Create the database named in `database_url` if it does not exist yet,
/// connecting through the `postgres` maintenance database.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let opts = PgConnectOptions::from_str(database_url).map_err(|_| ConfigError::InvalidValue {
        key: "DATABASE_URL",
        value: redact(database_url),
    })?;
    let db_name = match opts.get_database() {
        Some(name) if !name.is_empty() && name != "postgres" => name.to_string(),
        _ => return Ok(()),
    };
    let mut conn = opts.database("postgres").connect().await?;
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    conn.close().await?;
    Ok(())
}

/// URL without its password, for error messages.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => format!("{}://***{}", &url[..scheme], &url[at..]),
        _ => url.to_string(),
    }
}
