use askama::Template;
use askama_web::WebTemplate;
use axum::Extension;
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::csrf::get_or_create_csrf_token;
use crate::models::CurrentUser;

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    username: String,
    csrf_token: String,
}

/// The map page.
pub async fn index(
    Extension(user): Extension<CurrentUser>,
    session: Session,
) -> Result<IndexTemplate> {
    let csrf_token = get_or_create_csrf_token(&session).await?;

    Ok(IndexTemplate {
        username: user.username,
        csrf_token,
    })
}

pub async fn not_found() -> AppError {
    AppError::NotFound("Not Found".to_string())
}
