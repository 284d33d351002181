use std::sync::Arc;

use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equipment_ops::common::AppState;
use equipment_ops::config::Config;
use equipment_ops::jobs;
use equipment_ops::routes;
use equipment_ops::sources::{PartitionedReadingSource, SqlCatalogSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,equipment_ops=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting equipment-ops...");

    // Load configuration (fail-fast)
    let config = Config::from_env()?;
    tracing::info!(
        deployment = ?config.deployment,
        readings_root = %config.readings_root.display(),
        schedule = %config.schedule_time.format("%H:%M"),
        "Configuration loaded"
    );

    // Connect to the metrics store (fail-fast)
    tracing::info!("Connecting to database...");
    let db = Arc::new(Database::connect(&config.database_url).await?);
    tracing::info!("Database connection established");

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(db.as_ref(), None).await?;
    tracing::info!("Migrations completed");

    // Catalog may live in a separate database
    let catalog_db = if config.catalog_database_url == config.database_url {
        Arc::clone(&db)
    } else {
        tracing::info!("Connecting to catalog database...");
        Arc::new(Database::connect(&config.catalog_database_url).await?)
    };

    let readings = Arc::new(PartitionedReadingSource::new(config.readings_root.clone()));
    let catalog = Arc::new(SqlCatalogSource::new(catalog_db));

    let state = AppState::new(db, config.clone(), readings, catalog);

    // Spawn the daily scheduler (fire-and-forget, non-blocking)
    tracing::info!("Spawning pipeline scheduler...");
    tokio::spawn(jobs::scheduler::run_daily(state.clone()));

    // Build router
    let app = routes::build_router(state);

    // Start server with graceful shutdown
    let addr = config.bind_address();
    tracing::info!(address = %addr, "Starting server");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
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
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        },
    }
}
