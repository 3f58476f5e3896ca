pub mod test_helpers {
    use std::path::Path;

    use axum::Router;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use time::Duration;
    use tower_sessions::cookie::SameSite;
    use tower_sessions_sqlx_store::SqliteStore;

    use crate::config::{AppConfig, SessionConfig};
    use crate::{routes, AppState};

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        username: &str,
        password: &str,
    ) -> Result<i64, sqlx::Error> {
        let password_hash = crate::services::password::hash_password(password).map_err(|e| {
            sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
        })?;

        let result = sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(password_hash)
            .execute(pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Config rooted in a scratch directory (uploads, layout, exports).
    pub fn test_config(root: &Path) -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            upload_dir: root.join("uploads"),
            static_dir: root.join("static"),
            layout_shapefile: root.join("layout").join("bibiani_layout.shp"),
            cadastra_export_dir: root.join("shapefiles"),
            public_base_url: Some("http://testserver".to_string()),
            ..AppConfig::default()
        }
    }

    /// Full application router over `pool`, with plain-HTTP session cookies.
    pub async fn create_test_app(pool: SqlitePool, config: AppConfig) -> Result<Router, sqlx::Error> {
        let session_store = SqliteStore::new(pool.clone())
            .with_table_name("sessions_test")
            .map_err(|e| sqlx::Error::Configuration(e.into()))?;
        session_store.migrate().await?;

        let session_config = SessionConfig {
            secure: false,
            http_only: true,
            same_site: SameSite::Lax,
            expiry: Duration::hours(1),
            name: "parcelmap_session".to_string(),
        };

        let state = AppState::from_pool(pool, config);
        Ok(routes::build_router(
            state,
            session_config.create_layer(session_store),
        ))
    }
}
