//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::SecurityConfig;
use crate::db::{Store, User, is_unique_violation};
use crate::services::auth_service::{
    AuthError, AuthService, AuthUser, LoginResult, UserInfo, validate_new_password,
    validate_username,
};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
    allow_registration: bool,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig, allow_registration: bool) -> Self {
        Self {
            store,
            security,
            allow_registration,
        }
    }

    async fn user(&self, username: &str) -> Result<User, AuthError> {
        self.store
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

fn login_result(user: User) -> LoginResult {
    LoginResult {
        user: AuthUser {
            id: user.id,
            username: user.username,
        },
        api_key: user.api_key,
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let is_valid = self.store.verify_user_password(username, password).await?;

        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self.user(username).await?;
        Ok(login_result(user))
    }

    async fn register(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        if !self.allow_registration {
            return Err(AuthError::RegistrationDisabled);
        }

        validate_username(username)?;
        validate_new_password(password)?;

        if self.store.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }

        // A concurrent registration can still win the insert after the check above.
        let user = self
            .store
            .create_user(username, password, &self.security)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::UsernameTaken(username.to_string())
                } else {
                    AuthError::from(e)
                }
            })?;

        info!(user_id = user.id, "Registered user: {}", user.username);

        Ok(login_result(user))
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<AuthUser>, AuthError> {
        let user = self.store.verify_api_key(api_key).await?;
        Ok(user.map(|u| AuthUser {
            id: u.id,
            username: u.username,
        }))
    }

    async fn get_user_info(&self, username: &str) -> Result<UserInfo, AuthError> {
        let user = self.user(username).await?;

        Ok(UserInfo {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let is_valid = self
            .store
            .verify_user_password(username, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(username, new_password, &self.security)
            .await?;

        info!("Password changed for user: {username}");
        Ok(())
    }

    async fn get_api_key(&self, username: &str) -> Result<String, AuthError> {
        self.store
            .get_user_api_key(username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn regenerate_api_key(&self, username: &str) -> Result<String, AuthError> {
        let key = self.store.regenerate_user_api_key(username).await?;
        info!("API key regenerated for user: {username}");
        Ok(key)
    }
}
