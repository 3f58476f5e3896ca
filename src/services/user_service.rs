use crate::models::user::User;
use crate::repositories::{user_repository::UserRepository, RepositoryError};
use crate::services::password;
use std::sync::Arc;

pub const USERNAME_MIN_LEN: usize = 2;
pub const USERNAME_MAX_LEN: usize = 150;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Username must be between 2 and 150 characters")]
    InvalidUsername,
    #[error("Password is required")]
    EmptyPassword,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, UserServiceError> {
        let username = request.username.trim();
        self.validate_username(username)?;

        if request.password.is_empty() {
            return Err(UserServiceError::EmptyPassword);
        }
        if request.password != request.confirm_password {
            return Err(UserServiceError::PasswordMismatch);
        }

        if self.repository.find_by_username(username).await?.is_some() {
            return Err(UserServiceError::UsernameTaken);
        }

        let password_hash = password::hash_password(&request.password)
            .map_err(|e| UserServiceError::HashingError(e.to_string()))?;

        match self.repository.create_user(username, &password_hash).await {
            Ok(user) => {
                tracing::info!("Registered user {}", user.username);
                Ok(user)
            }
            // A concurrent registration can still win the unique index
            Err(RepositoryError::AlreadyExists) => Err(UserServiceError::UsernameTaken),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    fn validate_username(&self, username: &str) -> Result<(), UserServiceError> {
        let len = username.chars().count();
        if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
            return Err(UserServiceError::InvalidUsername);
        }
        Ok(())
    }
}
