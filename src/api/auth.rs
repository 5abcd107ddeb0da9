use axum::{
    Extension, Json,
    extract::{Query, Request, State, rejection::JsonRejection},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::validation::json_body;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::services::{AuthUser, LoginResult, UserInfo};

const SESSION_USER_KEY: &str = "user";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct AuthQuery {
    pub api_key: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub api_key: String,
}

impl From<LoginResult> for LoginResponse {
    fn from(result: LoginResult) -> Self {
        Self {
            username: result.user.username,
            api_key: result.api_key,
        }
    }
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that checks:
/// 1. Session cookie (from login)
/// 2. `X-Api-Key` header
/// 3. `Authorization: Bearer <api_key>` header
/// 4. `?api_key=` query parameter, when enabled in config
///
/// The resolved [`AuthUser`] is attached to the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    // Session first (web UI)
    if let Ok(Some(user)) = session.get::<AuthUser>(SESSION_USER_KEY).await {
        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(user);
        return Ok(next.run(request).await);
    }

    let allow_query = state.config().read().await.server.allow_api_key_in_query;

    if let Some(key) = extract_api_key(&query, &headers, allow_query) {
        match state.auth_service().verify_api_key(&key).await {
            Ok(Some(user)) => {
                tracing::Span::current().record("user_id", user.id);
                request.extensions_mut().insert(user);
                return Ok(next.run(request).await);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "API key lookup failed"),
        }
    }

    Err(ApiError::Unauthorized("Unauthorized".to_string()))
}

/// Extract API key from headers, or the query string when allowed
fn extract_api_key(query: &AuthQuery, headers: &HeaderMap, allow_query: bool) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
        && !key_str.trim().is_empty()
    {
        return Some(key_str.trim().to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && !token.trim().is_empty()
    {
        return Some(token.trim().to_string());
    }

    if allow_query {
        return query
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(ToString::to_string);
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Authenticate with username and password, returns API key on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let payload = json_body(payload)?;
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .login(&payload.username, &payload.password)
        .await?;

    start_session(&session, &result.user).await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// POST /auth/register
/// Create an account and log it in
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let payload = json_body(payload)?;
    let result = state
        .auth_service()
        .register(payload.username.trim(), &payload.password)
        .await?;

    start_session(&session, &result.user).await?;

    Ok(Json(ApiResponse::success(result.into())))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush session");
    }
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let info = state.auth_service().get_user_info(&user.username).await?;
    Ok(Json(ApiResponse::success(info)))
}

/// PUT /auth/password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let payload = json_body(payload)?;
    state
        .auth_service()
        .change_password(
            &user.username,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

/// GET /auth/api-key
pub async fn get_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state.auth_service().get_api_key(&user.username).await?;
    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

/// POST /auth/api-key/regenerate
/// Generate a new random API key. The old one stops working immediately.
pub async fn regenerate_api_key(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<ApiKeyResponse>>, ApiError> {
    let api_key = state
        .auth_service()
        .regenerate_api_key(&user.username)
        .await?;

    Ok(Json(ApiResponse::success(ApiKeyResponse { api_key })))
}

// ============================================================================
// Helpers
// ============================================================================

async fn start_session(session: &Session, user: &AuthUser) -> Result<(), ApiError> {
    session
        .insert(SESSION_USER_KEY, user)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn no_query() -> AuthQuery {
        AuthQuery { api_key: None }
    }

    #[test]
    fn header_key_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Api-Key", HeaderValue::from_static("from-header"));
        headers.insert("Authorization", HeaderValue::from_static("Bearer from-bearer"));

        assert_eq!(
            extract_api_key(&no_query(), &headers, false).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer  abc "));

        assert_eq!(
            extract_api_key(&no_query(), &headers, false).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn query_key_requires_opt_in() {
        let query = AuthQuery {
            api_key: Some("from-query".to_string()),
        };
        let headers = HeaderMap::new();

        assert_eq!(extract_api_key(&query, &headers, false), None);
        assert_eq!(
            extract_api_key(&query, &headers, true).as_deref(),
            Some("from-query")
        );
    }
}
