use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use super::{SESSION_USERNAME, SESSION_USER_ID};
use crate::error::AppError;
use crate::models::CurrentUser;

async fn current_user(session: &Session) -> Option<CurrentUser> {
    let id = session.get::<i64>(SESSION_USER_ID).await.ok().flatten()?;
    let username = session
        .get::<String>(SESSION_USERNAME)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();

    Some(CurrentUser { id, username })
}

/// Page routes: anonymous visitors are sent to the login form.
pub async fn require_auth(session: Session, mut request: Request, next: Next) -> Response {
    match current_user(&session).await {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// JSON routes: anonymous callers get `401 {"error": ...}`.
pub async fn require_api_auth(session: Session, mut request: Request, next: Next) -> Response {
    match current_user(&session).await {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => {
            tracing::debug!("Rejected anonymous API call to {}", request.uri().path());
            AppError::Unauthorized.into_response()
        }
    }
}

/// Login and registration forms bounce signed-in users to the map.
pub async fn redirect_if_authenticated(session: Session, request: Request, next: Next) -> Response {
    if current_user(&session).await.is_some() {
        Redirect::to("/").into_response()
    } else {
        next.run(request).await
    }
}
