//! GTM administration server
//!
//! Serves the JSON API over the configured document store.

use std::{net::SocketAddr, sync::Arc};

use gtm_admin::{
    config::{Config, StoreBackend},
    create_app,
    store::{DocumentStore, MemoryStore, PostgresStore},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gtm_server=debug,gtm_admin=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting GTM administration server");
    tracing::info!("Environment: {}", config.environment);

    let store = open_store(&config).await?;
    tracing::info!(backend = store.backend_name(), "Document store ready");

    // Create application state
    let state = AppState::new(store.clone(), config.clone());

    // Build application
    let app = create_app(state);

    // Start server
    let ip: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((ip, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Closing document store");
    store.close().await;

    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let store = PostgresStore::connect(&config.database).await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                store.migrate().await?;
                tracing::info!("Migrations completed");
            }
            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
