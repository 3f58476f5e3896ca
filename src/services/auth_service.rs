use crate::models::CurrentUser;
use crate::repositories::{user_repository::UserRepository, RepositoryError};
use crate::services::password;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Checks login credentials. Unknown usernames and wrong passwords are
/// indistinguishable to the caller.
pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn authenticate(
        &self,
        request: &LoginRequest,
    ) -> Result<CurrentUser, AuthServiceError> {
        let username = request.username.trim();

        let Some(user) = self.users.find_by_username(username).await? else {
            password::burn_verification(&request.password);
            tracing::debug!("Login for unknown user '{}'", username);
            return Err(AuthServiceError::InvalidCredentials);
        };

        if !password::verify_password(&request.password, &user.password_hash) {
            tracing::debug!("Wrong password for user {}", user.id);
            return Err(AuthServiceError::InvalidCredentials);
        }

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
        })
    }
}
