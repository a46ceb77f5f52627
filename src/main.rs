use recipe_api::{
    AppState,
    config::{AppConfig, Env},
    create_router, db,
    repository::{RepositoryState, SqliteRepository},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, the SQLite store, then the HTTP server.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter: RUST_LOG wins, otherwise verbose defaults for this crate.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "recipe_api=debug,tower_http=info,axum=trace".into());

    // 3. Log format by environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database: open the pool, then create or migrate the schema.
    let pool = db::connect(&config)
        .await
        .expect("FATAL: Failed to open the SQLite database. Check DATABASE_URL.");

    db::bootstrap(&pool)
        .await
        .expect("FATAL: Failed to initialize the database schema.");

    tracing::info!(url = %config.database_url, "database ready");

    let repo = Arc::new(SqliteRepository::new(pool)) as RepositoryState;

    // 5. State and router
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(repo, config));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
