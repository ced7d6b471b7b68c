use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::ServiceConfig;
use crate::error::Result;

pub async fn create_pool(config: &ServiceConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::debug!(max_connections = config.max_connections, "database pool created");
    Ok(pool)
}

/// Apply the policy, version, section, tag and framework tables.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("policy schema migrated");
    Ok(())
}

/// Open a pool and bring the schema up to date.
pub async fn connect(config: &ServiceConfig) -> Result<PgPool> {
    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}
