pub mod auth;
pub mod health;
pub mod tenants;

use axum::Router;

use crate::state::AppState;

/// Build the API route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                      register (public)
/// /auth/login                         login (public)
/// /auth/refresh                       refresh (public)
/// /auth/logout                        logout (requires auth)
/// /auth/me                            current principal (requires auth)
/// /auth/session                       principal if any (optional auth)
///
/// /tenants/{tenantId}/users/{userId}  user profile (owner or admin, same tenant)
/// ```
///
/// `/health` is mounted separately at the root by [`health::router`].
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(state))
        .nest("/tenants", tenants::router(state))
}
