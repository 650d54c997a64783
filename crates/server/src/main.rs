//! locker server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use locker_core::config::{AppConfig, StorageConfig};
use locker_server::{AppState, create_router};
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// locker - a minimal file registry server
#[derive(Parser, Debug)]
#[command(name = "lockerd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "LOCKER_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Load configuration from an optional TOML file overlaid with `LOCKER_` env vars.
///
/// Both layers merge onto [`AppConfig::default`], so a missing file is not an
/// error and a single variable such as `LOCKER_METADATA__PATH` overrides just
/// that field. Switching storage to S3 needs `LOCKER_STORAGE__TYPE=s3`.
fn load_config(config_path: &str) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if Path::new(config_path).exists() {
        tracing::info!(config_path = %config_path, "Loading configuration from file");
        figment = figment.merge(Toml::file(config_path));
    } else {
        tracing::info!(
            config_path = %config_path,
            "No config file found, using defaults and environment"
        );
    }

    let figment = figment.merge(Env::prefixed("LOCKER_").ignore(&["CONFIG"]).split("__"));
    let config: AppConfig = figment
        .extract()
        .context("failed to load configuration")?;

    // S3-only keys would otherwise be dropped silently by the filesystem variant.
    if matches!(config.storage, StorageConfig::Filesystem { .. })
        && figment.find_value("storage.bucket").is_ok()
    {
        anyhow::bail!(
            "invalid configuration: storage.bucket is set but storage.type is \"filesystem\"; \
             set storage.type = \"s3\" (LOCKER_STORAGE__TYPE=s3) to use S3"
        );
    }

    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid configuration")?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("locker v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;

    locker_server::metrics::register_metrics();

    let storage = locker_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;

    // Fail fast on a misconfigured or unreachable backend.
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(
        backend = storage.backend_name(),
        "Storage backend connectivity verified"
    );

    let metadata = locker_metadata::from_config(&config.metadata)
        .await
        .context("failed to initialize metadata index")?;
    tracing::info!("Metadata index initialized");

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;

    let state = AppState::new(config, storage, metadata);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM signal handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };

    tracing::info!(signal, "Shutdown signal received, draining connections");
}
