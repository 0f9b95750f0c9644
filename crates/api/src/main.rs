use std::net::SocketAddr;
use std::sync::Arc;

use spartan_cloud::{S3Config, S3Storage, SharedStorage};
use spartan_core::media::MediaPipeline;
use spartan_core::tool;
use spartan_db::repositories::SessionRepo;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spartan_api::bootstrap::bootstrap_admin;
use spartan_api::config::ServerConfig;
use spartan_api::middleware::rate_limit::RateLimiter;
use spartan_api::router::build_app_router;
use spartan_api::state::AppState;

/// External tools the media pipeline shells out to, with their version flag.
const MEDIA_TOOLS: [(&str, &str); 3] = [
    ("ffmpeg", "-version"),
    ("convert", "-version"),
    ("heif-convert", "--version"),
];

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spartan_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .map(|v| v.parse().expect("DB_MAX_CONNECTIONS must be a valid u32"))
        .unwrap_or(spartan_db::DEFAULT_MAX_CONNECTIONS);

    let pool = spartan_db::create_pool(&database_url, max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!(max_connections, "Database connection pool created");

    spartan_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    spartan_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    match SessionRepo::cleanup_expired(&pool).await {
        Ok(removed) => tracing::info!(removed, "Expired sessions cleaned up"),
        Err(e) => tracing::warn!(error = %e, "Failed to clean up expired sessions"),
    }

    bootstrap_admin(&pool)
        .await
        .expect("Failed to bootstrap administrator account");

    // --- Media tooling ---
    for (program, version_arg) in MEDIA_TOOLS {
        if tool::is_available(program, version_arg).await {
            tracing::info!(tool = program, "Media tool available");
        } else {
            tracing::warn!(tool = program, "Media tool not found; dependent conversions will fail");
        }
    }
    let media = Arc::new(MediaPipeline::new(
        config.media.scratch_dir.clone(),
        config.media.tool_timeout,
    ));

    // --- Object storage ---
    let storage: SharedStorage = Arc::new(S3Storage::connect(&S3Config::from_env()).await);

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        storage,
        media,
        rate_limiter: Arc::new(RateLimiter::per_minute(config.rate_limit_per_minute)),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
