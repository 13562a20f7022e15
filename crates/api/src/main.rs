use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::app::build_router;
use api::config::AppConfig;
use api::gql::build_schema;
use api::services::spawn_expiry_service;
use api::state::AppState;
use infra::PgBookingStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    let pool = infra::db::connect(&config.database_url, config.database_max_connections).await?;
    tracing::info!(
        "Connected to Postgres with max {} connections",
        config.database_max_connections
    );

    if config.skip_migrations {
        tracing::info!("Skipping database migrations (SKIP_MIGRATIONS=true)");
    } else {
        tracing::info!("Running database migrations...");
        infra::db::migrate(&pool).await?;
        tracing::info!("Database migrations completed successfully");
    }

    let port = config.port;
    let state = AppState::new(Arc::new(PgBookingStore::new(pool)), config);

    let schema = build_schema(state.clone());

    // Releases pending reservations nobody confirmed in time
    let _expiry_handle = spawn_expiry_service(state.clone());

    let app = build_router(state, schema);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
