use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod executor;
pub mod repository;
pub mod service;
pub mod state;
pub mod storage;

#[cfg(test)]
mod test_support;

use crate::auth::{CredentialVerifier, JwtConfig, StaticCredentials};
use crate::config::Config;
use crate::executor::PipelineExecutor;
use crate::repository::{JobStore, MemoryJobStore, PgJobStore};
use crate::service::JobService;
use crate::state::AppState;
use crate::storage::{FsObjectStore, ObjectStore, UrlSigner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgpipe_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting imgpipe server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    tracing::debug!("Configuration: {:?}", config);
    if config.uses_dev_secret() {
        tracing::warn!("JWT_SECRET not set, using the development secret");
    }

    let store: Arc<dyn JobStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url)
                .await
                .context("Failed to create database pool")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            Arc::new(PgJobStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, jobs are kept in memory");
            Arc::new(MemoryJobStore::new())
        }
    };

    let credentials: Arc<dyn CredentialVerifier> = match &config.users {
        Some(users) => Arc::new(StaticCredentials::parse(users).context("Invalid IMGPIPE_USERS")?),
        None => {
            tracing::warn!("IMGPIPE_USERS not set, using the development users");
            Arc::new(StaticCredentials::development())
        }
    };

    let signer = Arc::new(UrlSigner::new(
        config.jwt_secret.clone(),
        config.public_url.clone(),
        config.presign_ttl,
    ));
    tokio::fs::create_dir_all(&config.storage_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.storage_dir.display()))?;
    let objects: Arc<dyn ObjectStore> =
        Arc::new(FsObjectStore::new(config.storage_dir.clone(), Arc::clone(&signer)));

    let jobs = Arc::new(JobService::new(
        store,
        Arc::clone(&objects),
        Arc::new(PipelineExecutor::new()),
    ));
    jobs.ensure_seed(config.seed_image.as_deref())
        .await
        .context("Failed to store the seed image")?;

    let state = AppState {
        jobs,
        objects,
        signer,
        credentials,
        jwt: Arc::new(JwtConfig {
            secret: config.jwt_secret.clone(),
            expiry_mins: config.token_ttl_mins,
        }),
        max_upload_bytes: config.max_upload_bytes,
    };

    // Build router with all API endpoints
    let app = api::create_router(state);

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
