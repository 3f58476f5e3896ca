use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/parcelmap.db?mode=rwc";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_LAYOUT_SHAPEFILE: &str = "data/shapefiles/bibiani_layout.shp";
pub const DEFAULT_EXPORT_DIR: &str = "shapefiles";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

/// Runtime settings read from the environment (`.env` is loaded by the
/// binaries before this runs).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub layout_shapefile: PathBuf,
    pub layout_source_proj: Option<String>,
    /// Base for upload URLs. Derived from the `Host` header when unset.
    pub public_base_url: Option<String>,
    pub max_upload_bytes: usize,
    pub cadastra_export_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            layout_shapefile: PathBuf::from(DEFAULT_LAYOUT_SHAPEFILE),
            layout_source_proj: None,
            public_base_url: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cadastra_export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            database_url: string_var("DATABASE_URL").unwrap_or(defaults.database_url),
            host: string_var("HOST").unwrap_or(defaults.host),
            port: parsed_var("PORT")?.unwrap_or(defaults.port),
            upload_dir: string_var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            static_dir: string_var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            layout_shapefile: string_var("LAYOUT_SHAPEFILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.layout_shapefile),
            layout_source_proj: string_var("LAYOUT_SOURCE_PROJ"),
            public_base_url: string_var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            max_upload_bytes: parsed_var("MAX_UPLOAD_BYTES")?.unwrap_or(defaults.max_upload_bytes),
            cadastra_export_dir: string_var("CADASTRA_EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cadastra_export_dir),
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Unset and blank values are treated alike.
fn string_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    string_var(key)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| ConfigError::Invalid { key, value })
        })
        .transpose()
}
