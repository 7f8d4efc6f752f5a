//! Handlers for tenant-scoped user lookups.

use axum::extract::{Path, State};
use axum::Json;

use crate::auth::directory::AccountInfo;
use crate::error::AppResult;
use crate::handlers::auth::UserBody;
use crate::middleware::auth::TenantScope;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /tenants/{tenantId}/users/{userId}
///
/// The guard chain has already matched `tenantId` against the caller's tenant,
/// so the lookup uses the bound scope.
pub async fn get_user(
    State(state): State<AppState>,
    TenantScope(tenant_id): TenantScope,
    Path((_, user_id)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<UserBody<AccountInfo>>>> {
    let user = state.directory.find_profile(&tenant_id, &user_id).await?;
    Ok(Json(DataResponse::ok(UserBody { user })))
}
