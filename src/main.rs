use dotenvy::dotenv;
use shoe_store::{
    api::{self, AppState},
    config::{AppConfig, database, plans},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let config = AppConfig::from_env()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;
    info!(environment = ?config.environment, "Application configuration loaded.");

    // 4. Connect and make sure the schema exists
    let db = database::create_connection(&config.database_url)
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database tables initialized."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the plan catalog
    let catalog = plans::load_plans_or_builtin(&config.plans_path)?;
    database::seed_plan_limits(&db, &catalog)
        .await
        .inspect(|count| info!("Seeded {} plan limit rows.", count))
        .inspect_err(|e| error!("Failed to seed plan limits: {}", e))?;

    // 6. Serve
    let bind_addr = config.bind_addr;
    let app = api::router(AppState::new(db, config));
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", bind_addr, e))?;
    info!("Listening on http://{}", bind_addr);

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
    info!("Shutdown signal received.");
}
