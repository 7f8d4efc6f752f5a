//! Route definitions for the `/tenants` resource.

use axum::routing::get;
use axum::{middleware, Router};
use trancendos_core::guards::{require_ownership_or_admin, Guard};

use crate::handlers::tenant_users;
use crate::middleware::auth::authenticate;
use crate::middleware::rbac::{chain, enforce};
use crate::state::AppState;

/// Routes mounted at `/tenants`.
///
/// ```text
/// GET /{tenantId}/users/{userId}  -> get_user (owner or admin, same tenant)
/// ```
pub fn router(state: &AppState) -> Router<AppState> {
    let guards = chain([
        Guard::Tenant,
        Guard::TenantAccess,
        require_ownership_or_admin("userId"),
    ]);

    Router::new()
        .route("/{tenantId}/users/{userId}", get(tenant_users::get_user))
        .route_layer(middleware::from_fn_with_state(guards, enforce))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}
