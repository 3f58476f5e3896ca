pub mod handlers;
pub mod middleware;

/// Session keys written at login.
pub const SESSION_USER_ID: &str = "user_id";
pub const SESSION_USERNAME: &str = "username";
pub const SESSION_AUTH_TIMESTAMP: &str = "auth_timestamp";
