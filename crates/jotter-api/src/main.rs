//! jotter-api server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jotter_api::services::JwtAuthenticator;
use jotter_api::{build_router, AppConfig, AppState, StorageKind};
use jotter_core::Store;
use jotter_db::{Database, MemoryStore, PoolStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "jotter_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "jotter_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // File output rotates daily; the guard must live until shutdown to flush
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("jotter-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = AppConfig::from_env()?;
    info!(
        environment = %config.environment,
        storage = ?config.storage,
        ws_queue_capacity = config.ws_queue_capacity,
        ws_ping_interval_secs = config.ws_ping_interval_secs,
        "Configuration loaded"
    );

    let store: Arc<dyn Store> = match config.storage {
        StorageKind::Postgres => {
            info!("Connecting to database...");
            let db =
                Database::connect_with_config(&config.database_url, config.pool_config()).await?;
            info!("Database connected");

            info!("Running database migrations...");
            db.migrate().await?;
            info!("Database migrations complete");
            PoolStatus::of(db.pool()).log();
            Arc::new(db)
        }
        StorageKind::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let tokens = Arc::new(JwtAuthenticator::new(
        &config.jwt_secret,
        config.token_ttl_hours,
    ));
    let state = AppState::new(store, tokens, config.session_settings());

    let app = build_router(state, config.allowed_origins.clone());

    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
