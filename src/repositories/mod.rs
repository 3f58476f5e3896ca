pub mod cadastra_repository;
pub mod plot_repository;
pub mod user_repository;

pub use cadastra_repository::{CadastraRepository, SqliteCadastraRepository};
pub use plot_repository::{PlotRepository, SqlitePlotRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

use crate::geometry::GeometryError;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Stored geometry is invalid: {0}")]
    Geometry(#[from] GeometryError),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Unique index violations become `AlreadyExists`.
pub(crate) fn map_write_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            RepositoryError::AlreadyExists
        }
        _ => RepositoryError::Database(err),
    }
}
