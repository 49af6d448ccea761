//! HTTP server for the boilerplate API.
//!
//! Configuration comes from the environment (a `.env` file is loaded first);
//! see `AppConfig` for the variables and defaults.

use boilerplate_api::{app_router, apply_migrations, ensure_database_exists, AppConfig, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("boilerplate_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    ensure_database_exists(&config.database_url).await?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    apply_migrations(&pool, &config.database_schema).await?;

    let state = AppState::new(pool, config.database_schema.as_str());
    let app = app_router(state, &config)?;
    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        schema = %config.database_schema,
        "listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
