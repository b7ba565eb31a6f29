use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create jobs table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            seq BIGSERIAL NOT NULL,
            id UUID PRIMARY KEY,
            owner_id VARCHAR(255) NOT NULL,
            source_id TEXT NOT NULL,
            ops JSONB NOT NULL,
            status VARCHAR(32) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            finished_at TIMESTAMPTZ,
            input_key TEXT NOT NULL,
            output_key TEXT NOT NULL,
            error TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Tables created with a bounded source_id column
    sqlx::query("ALTER TABLE jobs ALTER COLUMN source_id TYPE TEXT")
        .execute(pool)
        .await?;

    // Owner listings walk this index in insertion order
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_owner_seq ON jobs(owner_id, seq)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
