//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use auth::domain::repository::RevocationStore;
use auth::{
    AuthAppState, AuthConfig, GoogleOAuthClient, GoogleOAuthConfig, MemoryRevocationStore,
    PgAuthRepository, PgRevocationStore, RevocationBackend, auth_router,
};
use axum::{
    Router, http,
    http::{Method, header},
};
use op::{OpAppState, OpConfig, PgOpRepository, op_router};
use platform::retry::RetryPolicy;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,op=info,platform=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPoolOptions::new()
        .max_connections(env_or("DATABASE_MAX_CONNECTIONS", 5)?)
        .acquire_timeout(Duration::from_secs(env_or(
            "DATABASE_ACQUIRE_TIMEOUT_SECS",
            120,
        )?))
        .max_lifetime(Duration::from_secs(env_or("DATABASE_MAX_LIFETIME_SECS", 3600)?))
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let store_retry = RetryPolicy::new(
        env_or("DATABASE_RETRY_MAX_ATTEMPTS", 3)?,
        Duration::from_millis(env_or("DATABASE_RETRY_BASE_DELAY_MS", 1000)?),
    );
    let auth_config = load_auth_config(store_retry)?;
    let op_config = OpConfig {
        store_retry,
        ..OpConfig::default()
    };

    // Refresh-token registry
    let revocations = match env::var("REVOCATION_BACKEND").as_deref() {
        Ok("memory") => {
            tracing::warn!("In-memory revocation registry: revocations are lost on restart");
            RevocationBackend::Memory(MemoryRevocationStore::new())
        }
        Ok("postgres") | Err(_) => RevocationBackend::Postgres(PgRevocationStore::new(pool.clone())),
        Ok(other) => anyhow::bail!("Unknown REVOCATION_BACKEND: {}", other),
    };

    // Startup cleanup: drop registry entries for tokens that expired anyway
    // Errors here should not prevent server startup
    match revocations.purge_expired().await {
        Ok(purged) => {
            tracing::info!(revocations_deleted = purged, "Revocation cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Revocation cleanup failed, continuing anyway");
        }
    }

    let google = match auth_config.google.clone() {
        Some(config) => Some(GoogleOAuthClient::new(config)?),
        None => {
            tracing::info!("Google login not configured");
            None
        }
    };

    let auth_state = AuthAppState::new(
        PgAuthRepository::new(pool.clone()),
        revocations,
        google,
        auth_config,
    );
    let guard = auth_state.guard();
    let op_state = OpAppState::new(PgOpRepository::new(pool.clone()), op_config);

    // CORS configuration
    let frontend_origins = env::var("CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let api = auth_router(auth_state).merge(op_router(op_state, guard));
    let app = Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env_or("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 31113)))?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Parse an optional environment variable, falling back to `default`
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value", key)),
        Err(_) => Ok(default),
    }
}

fn load_auth_config(store_retry: RetryPolicy) -> anyhow::Result<AuthConfig> {
    let base = if cfg!(debug_assertions) {
        AuthConfig::development()
    } else {
        AuthConfig::default()
    };

    let access_secret = env::var("ACCESS_SECRET_KEY").ok().map(String::into_bytes);
    let refresh_secret = env::var("REFRESH_SECRET_KEY").ok().map(String::into_bytes);
    let (access_secret, refresh_secret) = match (access_secret, refresh_secret) {
        (Some(access), Some(refresh)) => (access, refresh),
        _ if cfg!(debug_assertions) => {
            tracing::warn!("Token secrets not set, using random development secrets");
            (base.access_secret.clone(), base.refresh_secret.clone())
        }
        _ => anyhow::bail!("ACCESS_SECRET_KEY and REFRESH_SECRET_KEY must be set in production"),
    };

    let backend_url =
        env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:31113".to_string());
    let google = match (env::var("GOOGLE_CLIENT_ID"), env::var("GOOGLE_CLIENT_SECRET")) {
        (Ok(client_id), Ok(client_secret)) => Some(GoogleOAuthConfig {
            client_id,
            client_secret,
            redirect_uri: format!(
                "{}/api/auth/oauth/google/callback",
                backend_url.trim_end_matches('/')
            ),
        }),
        _ => None,
    };

    let config = AuthConfig {
        access_secret,
        refresh_secret,
        access_token_ttl: Duration::from_secs(env_or("ACCESS_TOKEN_EXPIRE_MINUTES", 1500u64)? * 60),
        refresh_token_ttl: Duration::from_secs(
            env_or("REFRESH_TOKEN_EXPIRE_DAYS", 7u64)? * 24 * 3600,
        ),
        store_retry,
        frontend_url: env::var("FRONTEND_URL").unwrap_or(base.frontend_url.clone()),
        google,
        ..base
    };

    anyhow::ensure!(
        config.secrets_are_valid(),
        "Token secrets must be non-empty and distinct"
    );

    Ok(config)
}
