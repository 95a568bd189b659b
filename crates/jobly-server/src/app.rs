//! Application state, router assembly and the serve loop.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use jobly::{JoblyError, Pool, PoolClient};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::auth::JwtKeys;
use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::routes;

const ENV_LOG: &str = "JOBLY_LOG";
const DEFAULT_LOG_FILTER: &str = "info,jobly=info,jobly_server=info";

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub keys: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(pool: Pool, keys: JwtKeys) -> Self {
        Self {
            pool,
            keys: Arc::new(keys),
        }
    }

    /// Check out a pooled connection.
    pub async fn client(&self) -> ApiResult<PoolClient> {
        self.pool
            .get()
            .await
            .map_err(|e| ApiError::from(JoblyError::from(e)))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/health", routes::health::routes())
        .nest("/companies", routes::companies::routes())
        .nest("/jobs", routes::jobs::routes())
        .nest("/users", routes::users::routes())
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .with_env_filter(filter)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

/// Issue a token for `username` straight from the database and print it.
///
/// This is how the first admin gets a token, and how anyone gets a new one
/// after theirs expires.
pub async fn print_token(config: &Config, username: &str) -> anyhow::Result<()> {
    let pool = jobly::create_pool_with_config(&config.database_url, 1)
        .context("Failed to create database pool")?;
    let client = pool.get().await.context("Failed to connect to the database")?;
    let user = jobly::models::user::get(&client, username).await?.user;
    let token = config.jwt_keys().issue(&user.username, user.is_admin)?;
    println!("{token}");
    Ok(())
}

/// Build the pool, optionally migrate, then serve until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = jobly::create_pool_with_config(&config.database_url, config.max_connections)
        .context("Failed to create database pool")?;

    if config.migrate {
        let report = jobly::migrate::run_pool(&pool)
            .await
            .context("Failed to apply migrations")?;
        tracing::info!(
            applied = report.applied_migrations().len(),
            "database schema up to date"
        );
    }

    let app = router(AppState::new(pool, config.jwt_keys()));

    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "jobly listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
