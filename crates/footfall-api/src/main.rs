//! Footfall analytics collector entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use footfall_api::config::Config;
use footfall_api::error::AppError;
use footfall_api::state::AppState;
use footfall_core::identity::SecureIdentitySource;
use footfall_core::time::SystemClock;
use footfall_event_store::{PgEventStore, pool, schema};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Footfall analytics collector");

    let config = Config::from_env()?;

    // The store must be reachable and provisioned before serving.
    let db_pool = pool::connect(&config.database_url, &config.pool).await?;
    schema::provision(&db_pool).await?;

    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(SecureIdentitySource),
        Arc::new(PgEventStore::new(db_pool)),
        config.capture,
    );
    let app = footfall_api::build_app(app_state);

    tracing::info!("Listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Completes on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
