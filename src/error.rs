use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::geometry::GeometryError;
use crate::repositories::RepositoryError;
use crate::services::{
    AuthServiceError, CadastraServiceError, LayoutError, PlotServiceError, UploadError,
    UserServiceError,
};

pub type Result<T> = std::result::Result<T, AppError>;

/// HTTP boundary error. Every variant renders as `{"error": message}`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict {
        message: String,
        suggested_plot_number: Option<String>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::Conflict {
                message,
                suggested_plot_number,
            } => json!({
                "error": message,
                "suggested_plot_number": suggested_plot_number,
            }),
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                json!({ "error": "Internal server error" })
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => AppError::Database(e),
            RepositoryError::NotFound => AppError::NotFound("Record not found".to_string()),
            RepositoryError::AlreadyExists => AppError::Conflict {
                message: "Record already exists".to_string(),
                suggested_plot_number: None,
            },
            RepositoryError::Geometry(e) => AppError::internal(e),
        }
    }
}

impl From<GeometryError> for AppError {
    fn from(err: GeometryError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<PlotServiceError> for AppError {
    fn from(err: PlotServiceError) -> Self {
        match err {
            PlotServiceError::Validation(msg) => AppError::Validation(msg),
            PlotServiceError::NotFound(_) => AppError::NotFound("Plot not found".to_string()),
            PlotServiceError::PlotNumberTaken { suggested } => AppError::Conflict {
                message: "Plot number already exists".to_string(),
                suggested_plot_number: Some(suggested),
            },
            PlotServiceError::Numbering(e) => AppError::internal(e),
            PlotServiceError::Repository(e) => e.into(),
        }
    }
}

impl From<CadastraServiceError> for AppError {
    fn from(err: CadastraServiceError) -> Self {
        match err {
            CadastraServiceError::Validation(msg) => AppError::Validation(msg),
            CadastraServiceError::NotFound(_) => {
                AppError::NotFound("Cadastra entry not found".to_string())
            }
            CadastraServiceError::Repository(e) => e.into(),
            other => AppError::internal(other),
        }
    }
}

impl From<LayoutError> for AppError {
    fn from(err: LayoutError) -> Self {
        match err {
            LayoutError::NotFound(_) | LayoutError::Empty(_) => AppError::NotFound(err.to_string()),
            other => AppError::internal(other),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::internal(err)
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::UsernameTaken => AppError::Conflict {
                message: err.to_string(),
                suggested_plot_number: None,
            },
            UserServiceError::InvalidUsername
            | UserServiceError::EmptyPassword
            | UserServiceError::PasswordMismatch => AppError::Validation(err.to_string()),
            UserServiceError::HashingError(msg) => AppError::Internal(msg),
            UserServiceError::RepositoryError(e) => e.into(),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials => AppError::Unauthorized,
            AuthServiceError::Repository(e) => e.into(),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        AppError::internal(format!("session: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_conflict_carries_suggestion() {
        let err: AppError = PlotServiceError::PlotNumberTaken {
            suggested: "Q7K2ZP".to_string(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Plot number already exists");
        assert_eq!(body["suggested_plot_number"], "Q7K2ZP");
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let response = AppError::Internal("disk on fire".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_layout_missing_is_not_found() {
        let err: AppError = LayoutError::NotFound("x.shp".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Shapefile not found");
    }

    #[test]
    fn test_validation_status() {
        let err: AppError = GeometryError::TooFewCoordinates.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
