use canteen_orders::{
    api::{self, AppState},
    config::{database, seed, server::ServerConfig},
    errors::Result,
};
use dotenvy::dotenv;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars may also be set externally
    dotenv().ok();

    // 3. Server settings
    let config = ServerConfig::from_env()
        .inspect_err(|e| error!("Failed to load server configuration: {}", e))?;

    // 4. Database and schema
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed empty tables from the config file, if there is one
    if Path::new(&config.seed_path).exists() {
        let seed_config = seed::load_config(&config.seed_path)?;
        seed::seed_if_empty(&db, &seed_config)
            .await
            .inspect_err(|e| error!("Failed to seed database: {}", e))?;
    } else {
        warn!(path = %config.seed_path, "seed file not found, skipping seeding");
    }

    // 6. Serve until Ctrl-C
    let app = api::router(AppState::new(db, &config.jwt_secret));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "canteen server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
