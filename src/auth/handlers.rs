use crate::middleware::csrf::{get_or_create_csrf_token, validate_csrf_form_field};
use crate::services::{
    auth_service::{AuthServiceError, LoginRequest},
    user_service::{RegisterRequest, UserServiceError},
};
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use super::{SESSION_AUTH_TIMESTAMP, SESSION_USERNAME, SESSION_USER_ID};

const CSRF_FAILURE: &str = "Invalid security token. Please refresh the page and try again.";

#[derive(Template)]
#[template(path = "auth/register.html")]
struct RegisterTemplate {
    error: Option<String>,
    username: String,
    csrf_token: String,
}

#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginTemplate {
    error: Option<String>,
    registered: bool,
    username: String,
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
    #[serde(default)]
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    csrf_token: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    registered: Option<String>,
}

fn render(template: impl Template, status: StatusCode) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Template rendering failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<html><body><h1>Error rendering page</h1></body></html>".to_string()),
            )
                .into_response()
        }
    }
}

async fn csrf_token_for(session: &Session) -> String {
    get_or_create_csrf_token(session).await.unwrap_or_else(|e| {
        tracing::warn!("Failed to issue CSRF token: {}", e);
        String::new()
    })
}

async fn register_form(
    session: &Session,
    status: StatusCode,
    error: Option<&str>,
    username: &str,
) -> Response {
    let template = RegisterTemplate {
        error: error.map(str::to_string),
        username: username.to_string(),
        csrf_token: csrf_token_for(session).await,
    };
    render(template, status)
}

async fn login_form(
    session: &Session,
    status: StatusCode,
    error: Option<&str>,
    registered: bool,
    username: &str,
) -> Response {
    let template = LoginTemplate {
        error: error.map(str::to_string),
        registered,
        username: username.to_string(),
        csrf_token: csrf_token_for(session).await,
    };
    render(template, status)
}

pub async fn register_page(session: Session) -> Response {
    register_form(&session, StatusCode::OK, None, "").await
}

pub async fn register_handler(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return register_form(&session, StatusCode::FORBIDDEN, Some(CSRF_FAILURE), &form.username)
            .await;
    }

    let request = RegisterRequest {
        username: form.username.clone(),
        password: form.password,
        confirm_password: form.confirm_password,
    };

    match app_state.user_service.register(request).await {
        Ok(_) => Redirect::to("/login?registered=1").into_response(),
        Err(err) => {
            let status = match err {
                UserServiceError::UsernameTaken => StatusCode::CONFLICT,
                UserServiceError::InvalidUsername
                | UserServiceError::EmptyPassword
                | UserServiceError::PasswordMismatch => StatusCode::BAD_REQUEST,
                UserServiceError::HashingError(_) | UserServiceError::RepositoryError(_) => {
                    tracing::error!("Registration failed: {}", err);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                "Registration failed. Please try again.".to_string()
            } else {
                err.to_string()
            };
            register_form(&session, status, Some(&message), &form.username).await
        }
    }
}

pub async fn login_page(session: Session, Query(query): Query<LoginQuery>) -> Response {
    login_form(
        &session,
        StatusCode::OK,
        None,
        query.registered.is_some(),
        "",
    )
    .await
}

pub async fn login_handler(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    if validate_csrf_form_field(&session, &form.csrf_token)
        .await
        .is_err()
    {
        return login_form(
            &session,
            StatusCode::FORBIDDEN,
            Some(CSRF_FAILURE),
            false,
            &form.username,
        )
        .await;
    }

    let request = LoginRequest {
        username: form.username.clone(),
        password: form.password,
    };

    match app_state.auth_service.authenticate(&request).await {
        Ok(user) => {
            if let Err(e) = start_session(&session, user.id, &user.username).await {
                tracing::error!("Failed to create session: {}", e);
                return login_form(
                    &session,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Some("Failed to create session"),
                    false,
                    &form.username,
                )
                .await;
            }

            tracing::info!("User {} logged in", user.username);
            Redirect::to("/").into_response()
        }
        Err(AuthServiceError::InvalidCredentials) => {
            tracing::info!("Failed login for '{}'", form.username);
            login_form(
                &session,
                StatusCode::UNAUTHORIZED,
                Some("Invalid username or password"),
                false,
                &form.username,
            )
            .await
        }
        Err(err) => {
            tracing::error!("Login failed: {}", err);
            login_form(
                &session,
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("An error occurred. Please try again."),
                false,
                &form.username,
            )
            .await
        }
    }
}

/// New session id on login so a pre-login id cannot be reused.
async fn start_session(
    session: &Session,
    user_id: i64,
    username: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(SESSION_USER_ID, user_id).await?;
    session.insert(SESSION_USERNAME, username).await?;
    session
        .insert(SESSION_AUTH_TIMESTAMP, chrono::Utc::now().timestamp())
        .await?;
    Ok(())
}

pub async fn logout_handler(session: Session) -> impl IntoResponse {
    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to flush session on logout: {}", e);
    }
    Redirect::to("/login")
}
