//! Domain service for authentication and user management.
//!
//! Handles login, registration, password changes, and API key management.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Registration is disabled")]
    RegistrationDisabled,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// The authenticated caller. Stored in the session and attached to each
/// protected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
}

/// User info DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: i32,
    pub username: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Login result containing the user and their API key.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: AuthUser,
    pub api_key: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// - [`AuthError::RegistrationDisabled`] when sign-up is turned off
    /// - [`AuthError::Validation`] for a malformed username or short password
    /// - [`AuthError::UsernameTaken`] when the name exists
    async fn register(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Resolves an API key to its owner.
    async fn verify_api_key(&self, api_key: &str) -> Result<Option<AuthUser>, AuthError>;

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError>;

    /// Changes a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if current password is incorrect or new password invalid.
    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    async fn get_api_key(&self, username: &str) -> Result<String, AuthError>;

    async fn regenerate_api_key(&self, username: &str) -> Result<String, AuthError>;
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_username(username: &str) -> Result<(), AuthError> {
    let len = username.chars().count();
    if !(3..=32).contains(&len) {
        return Err(AuthError::Validation(
            "Username must be between 3 and 32 characters".to_string(),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AuthError::Validation(
            "Username can only contain letters, numbers, hyphens, and underscores".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_new_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
