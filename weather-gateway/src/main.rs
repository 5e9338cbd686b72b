use common::tracing::init_tracing_for;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use weather_gateway::config::Config;
use weather_gateway::store::memory::{DEFAULT_REQUEST_LOG_CAPACITY, MemoryStore};
use weather_gateway::store::postgres::PgStore;
use weather_gateway::store::{CacheStore, ProvenanceStore, SavedCityStore};
use weather_gateway::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();
    init_tracing_for(&config.log_format);

    let (cache, provenance, saved_cities): (
        Arc<dyn CacheStore>,
        Arc<dyn ProvenanceStore>,
        Arc<dyn SavedCityStore>,
    ) = match &config.database_url {
        Some(database_url) => {
            let store = Arc::new(PgStore::connect(database_url).await?);
            info!("Using PostgreSQL store");
            (store.clone(), store.clone(), store)
        }
        None => {
            warn!(
                request_log_capacity = DEFAULT_REQUEST_LOG_CAPACITY,
                "DATABASE_URL not set, using in-memory store; data is lost on restart \
                 and only the newest request log entries are kept"
            );
            let store = Arc::new(MemoryStore::new());
            (store.clone(), store.clone(), store)
        }
    };

    let state = AppState::build(&config, cache, provenance, saved_cities)?;
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Weather gateway starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Weather gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    warn!("Shutting down gracefully...");
}
