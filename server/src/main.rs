//! Basket Server binary.

use std::sync::Arc;

use basket_server::config::Config;
use basket_server::db::{self, CartRepository, MemoryCartRepository, PgCartRepository};
use basket_server::{app, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "basket_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!("Starting Basket Server on {}", config.address());

    let repo: Arc<dyn CartRepository> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url, config.max_connections).await?;
            tracing::info!("Running database migrations...");
            db::run_migrations(&pool).await?;
            Arc::new(PgCartRepository::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, carts are kept in memory with a demo catalog");
            Arc::new(MemoryCartRepository::with_demo_catalog())
        }
    };

    let addr = config.address();
    let app = app(AppState::new(repo, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
