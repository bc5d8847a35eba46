use mcphub::{config::AppConfig, db, routes, AppState};

use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcphub=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // Database connection
    let pool = db::create_pool(&config).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let app_state = AppState::new(pool.clone(), config.admin_token.clone());

    if config.seed_sample_servers {
        match app_state.registry.seed_sample_servers().await {
            Ok(0) => tracing::info!("MCP servers already exist in database"),
            Ok(count) => tracing::info!("Seeded {} sample MCP servers", count),
            Err(e) => tracing::warn!("Failed to seed sample servers: {}", e),
        }
    }

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let app = routes::create_router(app_state).layer(cors_layer);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
