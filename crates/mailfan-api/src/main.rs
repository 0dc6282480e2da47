//! Mailfan server binary.
//!
//! Batch contact deduplication with email broadcast.
//!
//! # Usage
//!
//! ```bash
//! # With config file
//! mailfan --config config.yaml
//!
//! # With environment variables only
//! MAILFAN_STORAGE__BACKEND=memory mailfan
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::signal;
use tracing::{info, Level};

use mailfan_api::http::{create_router, AppState};
use mailfan_api::observability::{init_logging, LoggingConfig};
use mailfan_server::{MailTransport, ServerConfig, SmtpMailer};
use mailfan_storage::{ContactStore, MemoryContactStore, PostgresConfig, PostgresContactStore};

/// Mailfan - contact deduplication and email broadcast server
#[derive(Parser, Debug)]
#[command(name = "mailfan")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = if let Some(config_path) = args.config {
        ServerConfig::load(&config_path)?
    } else {
        ServerConfig::from_env()?
    };

    init_logging(LoggingConfig {
        json_format: config.logging.json,
        default_level: parse_log_level(&config.logging.level),
    });

    info!(version = env!("CARGO_PKG_VERSION"), "Starting mailfan server");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let mailer = Arc::new(SmtpMailer::new(
        &config.mail.smtp_host,
        config.mail.smtp_port,
        config.mail.username.clone(),
        config.mail.password.clone(),
        &config.mail.from,
    )?);

    match config.storage.backend.as_str() {
        "memory" => {
            info!("Using in-memory storage backend");
            let storage = Arc::new(MemoryContactStore::new());
            run_server(storage, mailer, addr).await
        }
        "postgres" => {
            let database_url = config.storage.database_url.as_ref().ok_or_else(|| {
                anyhow::anyhow!("storage.database_url is required for postgres backend")
            })?;

            info!("Connecting to PostgreSQL database");
            let pg_config = PostgresConfig {
                database_url: database_url.clone(),
                max_connections: config.storage.pool_size,
                connect_timeout_secs: config.storage.connect_timeout_secs,
                ..Default::default()
            };

            let storage = PostgresContactStore::from_config(&pg_config).await?;
            info!("PostgreSQL connection established");

            info!("Running database migrations");
            storage.run_migrations().await?;
            info!("Database migrations complete");

            run_server(Arc::new(storage), mailer, addr).await
        }
        other => {
            anyhow::bail!("Unknown storage backend: {}", other);
        }
    }
}

/// Run the HTTP server with graceful shutdown.
async fn run_server<S, M>(storage: Arc<S>, mailer: Arc<M>, addr: SocketAddr) -> anyhow::Result<()>
where
    S: ContactStore,
    M: MailTransport,
{
    let state = AppState::new(storage, mailer);
    let router = create_router(state);

    info!(%addr, "HTTP server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

/// Parse log level from string.
fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}
