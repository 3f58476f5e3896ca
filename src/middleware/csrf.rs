use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{debug, warn};
use uuid::Uuid;

pub const CSRF_TOKEN_KEY: &str = "csrf_token";
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Tokens older than this are refused and reissued.
const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrfToken {
    pub value: String,
    pub created_at: i64,
}

impl CsrfToken {
    pub fn new() -> Self {
        Self {
            value: Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() - self.created_at > TOKEN_TTL_SECS
    }
}

impl Default for CsrfToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Log-safe prefix of a token.
fn prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}

pub async fn generate_csrf_token(
    session: &Session,
) -> Result<String, tower_sessions::session::Error> {
    let token = CsrfToken::new();
    let value = token.value.clone();

    session.insert(CSRF_TOKEN_KEY, token).await?;

    debug!("Generated new CSRF token: {}", prefix(&value));
    Ok(value)
}

pub async fn get_or_create_csrf_token(
    session: &Session,
) -> Result<String, tower_sessions::session::Error> {
    let token: Option<CsrfToken> = session.get(CSRF_TOKEN_KEY).await?;

    match token {
        Some(existing_token) if !existing_token.is_expired() => Ok(existing_token.value),
        _ => generate_csrf_token(session).await,
    }
}

async fn stored_token(session: &Session) -> Result<CsrfToken, StatusCode> {
    let stored: Option<CsrfToken> = session.get(CSRF_TOKEN_KEY).await.map_err(|e| {
        warn!("Failed to get CSRF token from session: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match stored {
        Some(token) if !token.is_expired() => Ok(token),
        Some(_) => {
            warn!("CSRF token expired");
            Err(StatusCode::FORBIDDEN)
        }
        None => {
            warn!("No CSRF token in session");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

/// Checks `X-CSRF-Token` on unsafe methods when the header is present.
///
/// The map client sends JSON and multipart bodies that may omit the header;
/// those requests pass through to the session-authenticated handlers. Form
/// handlers call [`validate_csrf_form_field`] themselves.
pub async fn csrf_validation_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let method = request.method().clone();

    if matches!(method, Method::GET | Method::HEAD | Method::OPTIONS) {
        return Ok(next.run(request).await);
    }

    let provided_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let Some(token) = provided_token else {
        return Ok(next.run(request).await);
    };

    let path = request.uri().path().to_string();
    let stored = stored_token(&session).await?;

    if token != stored.value {
        warn!(
            "CSRF header mismatch for {} {}: expected {}, got {}",
            method,
            path,
            prefix(&stored.value),
            prefix(&token)
        );
        return Err(StatusCode::FORBIDDEN);
    }

    // Header tokens stay valid for the whole page lifetime; the map issues
    // several requests per page load.
    debug!("CSRF header validated for {} {}", method, path);
    Ok(next.run(request).await)
}

/// Validate the hidden `csrf_token` field of a posted form, then rotate it.
pub async fn validate_csrf_form_field(
    session: &Session,
    form_token: &str,
) -> Result<(), StatusCode> {
    let stored = stored_token(session).await?;

    if form_token != stored.value {
        warn!(
            "CSRF form token mismatch: expected {}, got {}",
            prefix(&stored.value),
            prefix(form_token)
        );
        return Err(StatusCode::FORBIDDEN);
    }

    if let Err(e) = generate_csrf_token(session).await {
        warn!("Failed to rotate CSRF token: {}", e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_sessions::MemoryStore;

    fn session() -> Session {
        let store = std::sync::Arc::new(MemoryStore::default());
        Session::new(None, store, None)
    }

    #[tokio::test]
    async fn test_csrf_token_generation() {
        let session = session();

        let token1 = generate_csrf_token(&session).await.unwrap();
        let token2 = generate_csrf_token(&session).await.unwrap();
        assert!(!token1.is_empty());
        assert_ne!(token1, token2, "Tokens should be unique");
    }

    #[tokio::test]
    async fn test_csrf_token_expiry() {
        let token = CsrfToken {
            value: "test".to_string(),
            created_at: chrono::Utc::now().timestamp() - 100000,
        };
        assert!(token.is_expired());
        assert!(!CsrfToken::new().is_expired());
    }

    #[tokio::test]
    async fn test_get_or_create_csrf_token_is_stable() {
        let session = session();

        let token1 = get_or_create_csrf_token(&session).await.unwrap();
        let token2 = get_or_create_csrf_token(&session).await.unwrap();
        assert_eq!(token1, token2);
    }

    #[tokio::test]
    async fn test_form_field_validation_rotates() {
        let session = session();
        let token = get_or_create_csrf_token(&session).await.unwrap();

        assert_eq!(
            validate_csrf_form_field(&session, "bad").await,
            Err(StatusCode::FORBIDDEN)
        );
        assert!(validate_csrf_form_field(&session, &token).await.is_ok());

        // Replaying the used token fails
        assert_eq!(
            validate_csrf_form_field(&session, &token).await,
            Err(StatusCode::FORBIDDEN)
        );
    }

    #[tokio::test]
    async fn test_form_field_without_session_token() {
        let session = session();
        assert_eq!(
            validate_csrf_form_field(&session, "anything").await,
            Err(StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn test_prefix_handles_short_tokens() {
        assert_eq!(prefix("abc"), "abc");
        assert_eq!(prefix("0123456789"), "01234567");
    }
}
