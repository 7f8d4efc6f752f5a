//! Bearer-token authentication: middleware and extractors.
//!
//! [`authenticate`] and [`optional_auth`] run as route layers and bind the
//! verified [`Principal`] and its [`TenantId`] into request extensions.
//! Handlers read them back through [`AuthUser`], [`MaybeAuthUser`] and
//! [`TenantScope`].

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use trancendos_core::error::CoreError;
use trancendos_core::guards::extract_bearer;
use trancendos_core::principal::{Principal, TenantId};

use crate::auth::jwt::{verify_access_token, JwtConfig, TokenError};
use crate::error::AppError;
use crate::state::AppState;

/// Verify the `Authorization` header and build a sanitized principal.
///
/// Expired tokens yield [`CoreError::TokenExpired`]; every other
/// verification failure collapses to [`CoreError::AuthFailed`].
pub fn authenticate_header(headers: &HeaderMap, jwt: &JwtConfig) -> Result<Principal, CoreError> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = extract_bearer(header)?;

    let claims = verify_access_token(token, jwt).map_err(|e| match e {
        TokenError::Expired => CoreError::TokenExpired,
        _ => CoreError::AuthFailed,
    })?;

    Ok(Principal::from_claims(
        &claims.user_id,
        &claims.tenant_id,
        &claims.role,
        &claims.email,
    ))
}

fn bind_principal(req: &mut Request, principal: Principal) {
    req.extensions_mut()
        .insert(TenantId(principal.tenant_id.clone()));
    req.extensions_mut().insert(principal);
}

/// Reject the request unless it carries a valid access token.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = authenticate_header(req.headers(), &state.config.jwt).inspect_err(|e| {
        tracing::debug!(code = e.code(), path = %req.uri().path(), "Authentication rejected");
    })?;
    bind_principal(&mut req, principal);
    Ok(next.run(req).await)
}

/// Bind a principal when the token verifies; otherwise continue anonymously.
pub async fn optional_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    if let Ok(principal) = authenticate_header(req.headers(), &state.config.jwt) {
        bind_principal(&mut req, principal);
    }
    next.run(req).await
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Authenticated principal.
///
/// Taken from the extensions bound by [`authenticate`]; on routes without
/// that layer the header is verified here instead.
///
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(AuthUser(principal.clone()));
        }
        let principal = authenticate_header(&parts.headers, &state.config.jwt)?;
        Ok(AuthUser(principal))
    }
}

/// Principal when one could be established, `None` otherwise. Never rejects.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<Principal>);

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = match parts.extensions.get::<Principal>() {
            Some(principal) => Some(principal.clone()),
            None => authenticate_header(&parts.headers, &state.config.jwt).ok(),
        };
        Ok(MaybeAuthUser(principal))
    }
}

/// Tenant bound to the request. Rejects with `TenantRequired` when none is.
#[derive(Debug, Clone)]
pub struct TenantScope(pub String);

impl<S: Send + Sync> FromRequestParts<S> for TenantScope {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantId>()
            .filter(|t| !t.0.is_empty())
            .map(|t| TenantScope(t.0.clone()))
            .ok_or(AppError::Core(CoreError::TenantRequired))
    }
}
