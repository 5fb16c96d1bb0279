//! revu-bd (Business Directory) - scoring and entitlement service
//!
//! Subcommands:
//! - `recompute`: recompute every business's Bayesian-average rating
//! - `features <guid>`: print a business's effective features as JSON
//! - `serve`: run the REST API

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};
use uuid::Uuid;

use revu_bd::{build_router, recompute, AppState};
use revu_common::config::{database_path, resolve_root_folder, TomlConfig};
use revu_common::db::init_database;

/// Command-line arguments for revu-bd
#[derive(Parser, Debug)]
#[command(name = "revu-bd")]
#[command(about = "Business directory rating and entitlement service")]
#[command(version)]
struct Args {
    /// Root folder holding revu.db
    #[arg(short, long, global = true, env = "REVU_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Config file (defaults to the platform config location)
    #[arg(short, long, global = true, env = "REVU_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recompute ratings for every business
    Recompute {
        /// Businesses processed concurrently (overrides config)
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Print a business's effective features
    Features {
        /// Business GUID
        guid: Uuid,
    },

    /// Run the HTTP API
    Serve {
        /// Listen address (overrides config)
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .init();

    info!("Starting revu-bd v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    match args.command {
        Command::Recompute { concurrency } => {
            let concurrency = concurrency.unwrap_or(config.batch.concurrency);
            let report = recompute::recompute_all(&pool, concurrency)
                .await
                .context("Failed to list businesses")?;

            if report.failed > 0 {
                warn!(
                    failed = report.failed,
                    "Some businesses were not updated; see errors above"
                );
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Features { guid } => {
            let features = revu_bd::api::features::load_features(&pool, guid)
                .await
                .with_context(|| format!("Failed to resolve features for {}", guid))?;
            println!("{}", serde_json::to_string_pretty(&features)?);
        }

        Command::Serve { bind } => {
            let bind = bind.unwrap_or(config.server.bind.clone());
            let state = AppState::new(pool, config.batch.concurrency);
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind to {}", bind))?;
            info!("revu-bd listening on http://{}", bind);
            info!("Health check: http://{}/health", bind);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;

            info!("Server shutdown complete");
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
