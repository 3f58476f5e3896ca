use parcelmap::{
    config::{validate_production_config, AppConfig, SessionConfig},
    db, routes, AppState,
};

use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "parcelmap=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    validate_production_config()?;
    let config = AppConfig::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let session_store = SqliteStore::new(pool.clone())
        .with_table_name("sessions")
        .map_err(anyhow::Error::msg)?;
    session_store.migrate().await?;
    let session_layer = SessionConfig::from_env().create_layer(session_store);

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    if !config.layout_shapefile.is_file() {
        tracing::warn!(
            "Layout shapefile {} not found; /bibiani_layout will return 404",
            config.layout_shapefile.display()
        );
    }

    let addr = config.socket_addr()?;
    let app = routes::build_router(AppState::from_pool(pool, config), session_layer);

    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
