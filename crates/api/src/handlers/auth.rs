//! Handlers for the `/auth` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use trancendos_core::principal::Principal;

use crate::auth::directory::AuthSession;
use crate::error::AppResult;
use crate::extract::JsonBody;
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
///
/// Missing fields deserialize as empty and are reported by validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub tenant_id: String,
    pub role: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub tenant_id: String,
}

/// Request body for `POST /auth/refresh` and `POST /auth/logout`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenBody {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserBody<T: Serialize> {
    pub user: T,
}

#[derive(Debug, Serialize)]
pub struct SessionBody {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Principal>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AuthSession>>)> {
    let session = state
        .directory
        .register(
            &input.email,
            &input.password,
            &input.tenant_id,
            input.role.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse::ok(session))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthSession>>> {
    let session = state
        .directory
        .login(&input.email, &input.password, &input.tenant_id)
        .await?;
    Ok(Json(DataResponse::ok(session)))
}

/// POST /auth/refresh
///
/// Issues a new access token. The refresh token stays valid.
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RefreshRequest>,
) -> AppResult<Json<DataResponse<AccessTokenBody>>> {
    let access_token = state.directory.refresh(&input.refresh_token).await?;
    Ok(Json(DataResponse::ok(AccessTokenBody { access_token })))
}

/// POST /auth/logout (requires auth)
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(input): JsonBody<RefreshRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.directory.logout(&input.refresh_token).await?;
    tracing::info!(user_id = %user.user_id, tenant_id = %user.tenant_id, "User logged out");
    Ok(Json(MessageResponse::ok("Logged out successfully")))
}

/// GET /auth/me (requires auth)
pub async fn me(AuthUser(user): AuthUser) -> Json<DataResponse<UserBody<Principal>>> {
    Json(DataResponse::ok(UserBody { user }))
}

/// GET /auth/session
///
/// Reports whether the caller presented a valid token. Never rejects.
pub async fn session(MaybeAuthUser(user): MaybeAuthUser) -> Json<DataResponse<SessionBody>> {
    Json(DataResponse::ok(SessionBody {
        authenticated: user.is_some(),
        user,
    }))
}
