// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::domains::locations::{AddressSyncCoordinator, GeocodeResolver};
use server_core::domains::organization::models::PostgresOrganizationStore;
use server_core::domains::verification::{
    NotificationDispatcher, ScanConfig, VerificationScanner,
};
use server_core::kernel::{MailerClient, PostcodeApiClient, VerificationScheduler};
use server_core::server::{build_app, AppState};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Support Services Directory API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire the lifecycle engine
    let mailer = Arc::new(MailerClient::new(
        config.mail_api_url,
        config.mail_api_token,
        config.mail_from_address,
    ));
    let store = Arc::new(PostgresOrganizationStore::new(pool.clone()));
    let scanner = Arc::new(VerificationScanner::new(
        store,
        NotificationDispatcher::new(mailer),
        ScanConfig::default(),
    ));

    let geocoder = Arc::new(PostcodeApiClient::new(config.postcode_api_url));
    let coordinator = Arc::new(AddressSyncCoordinator::new(GeocodeResolver::new(geocoder)));

    // Start the daily verification scan
    let mut scheduler = VerificationScheduler::new(Arc::clone(&scanner))
        .with_schedule(&config.verification_scan_cron);
    scheduler
        .start()
        .await
        .context("Failed to start verification scheduler")?;

    // Build application
    let app = build_app(AppState {
        db_pool: pool,
        scanner,
        coordinator,
    });

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    scheduler.stop().await?;

    Ok(())
}
