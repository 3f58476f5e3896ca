pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod geometry;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use config::AppConfig;
use repositories::{SqliteCadastraRepository, SqlitePlotRepository, SqliteUserRepository};
use services::{
    AuthService, CadastraService, LayoutService, PlotService, UploadStore, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub plot_service: Arc<PlotService>,
    pub cadastra_service: Arc<CadastraService>,
    pub layout_service: Arc<LayoutService>,
    pub upload_store: Arc<UploadStore>,
}

impl AppState {
    /// Wire the SQLite repositories and services over one pool.
    pub fn from_pool(pool: sqlx::SqlitePool, config: AppConfig) -> Self {
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let plot_repository = Arc::new(SqlitePlotRepository::new(pool.clone()));
        let cadastra_repository = Arc::new(SqliteCadastraRepository::new(pool));

        let layout_service = LayoutService::new(
            config.layout_shapefile.clone(),
            config.layout_source_proj.clone(),
        );
        let upload_store = UploadStore::new(config.upload_dir.clone());

        Self {
            user_service: Arc::new(UserService::new(user_repository.clone())),
            auth_service: Arc::new(AuthService::new(user_repository)),
            plot_service: Arc::new(PlotService::new(plot_repository)),
            cadastra_service: Arc::new(CadastraService::new(cadastra_repository)),
            layout_service: Arc::new(layout_service),
            upload_store: Arc::new(upload_store),
            config: Arc::new(config),
        }
    }
}
