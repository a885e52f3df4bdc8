use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use elevra::config::{get_config, CliArgs};
use elevra::integrations::telemetry;
use elevra::{create_app, db, run_migrations, AppState};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(debug: bool) -> EnvFilter {
    let default = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenv::dotenv().ok();

    let args = CliArgs::parse();
    let debug = args.debug;

    // Config loading logs to stdout before the full subscriber exists
    let startup = fmt().with_env_filter(env_filter(debug)).finish();
    let config = tracing::subscriber::with_default(startup, || get_config(args));

    // JSON log files, kept open by the guard until main returns
    let (file_layer, _file_guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "elevra.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    // Error reporting, flushed when the guard drops at the end of main
    let mut dsn_error = None;
    let sentry_guard = match config.sentry_dsn.as_deref() {
        Some(dsn) => match telemetry::init_sentry(dsn, &config.environment) {
            Ok(guard) => Some(guard),
            Err(err) => {
                dsn_error = Some(err);
                None
            }
        },
        None => None,
    };
    let telemetry_layer = sentry_guard.as_ref().map(|_| telemetry::layer());

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(fmt::layer())
        .with(file_layer)
        .with(telemetry_layer)
        .init();

    if let Some(err) = dsn_error {
        warn!("Error telemetry disabled: {}", err);
    }

    // Initialize the database pool and bring the schema up to date
    let pool = db::init_pool(&config.database_url)
        .with_context(|| format!("Failed to open database at {}", config.database_url))?;
    run_migrations(&mut *pool.get().context("Failed to get a database connection")?)?;
    let pool = Arc::new(pool);

    let state = AppState::new(pool, &config);
    let app = create_app(state).layer(CorsLayer::permissive());

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!("Elevra listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
