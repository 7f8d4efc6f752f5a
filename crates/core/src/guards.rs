//! Request guards: ordered checks over a [`RequestContext`].
//!
//! A guard either accepts the context or returns the [`CoreError`] that the
//! transport should render. [`run_guards`] applies a chain and stops at the
//! first rejection.

use crate::error::CoreError;
use crate::principal::{Principal, RequestContext};
use crate::roles::{has_permission, has_role_level, Role, ROLE_ADMIN};

/// Longest bearer token accepted from the `Authorization` header.
pub const MAX_TOKEN_LEN: usize = 2048;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// Role must be one of the listed roles (exact match).
    AnyRole(Vec<Role>),
    /// Role must rank at least this high.
    MinRole(Role),
    /// Role must hold every listed permission.
    Permissions(Vec<String>),
    /// The `param` path parameter (or, failing that, JSON body field) must
    /// name the caller, or the caller is admin or above.
    OwnershipOrAdmin { param: String },
    /// A tenant scope must be bound.
    Tenant,
    /// An explicitly requested tenant must equal the bound tenant.
    TenantAccess,
}

pub fn require_role(roles: &[Role]) -> Guard {
    Guard::AnyRole(roles.to_vec())
}

pub fn require_min_role(min_role: Role) -> Guard {
    Guard::MinRole(min_role)
}

pub fn require_permission(permissions: &[&str]) -> Guard {
    Guard::Permissions(permissions.iter().map(|p| (*p).to_string()).collect())
}

pub fn require_ownership_or_admin(param: &str) -> Guard {
    Guard::OwnershipOrAdmin {
        param: param.to_string(),
    }
}

impl Guard {
    pub fn check(&self, ctx: &RequestContext) -> Result<(), CoreError> {
        match self {
            Guard::AnyRole(roles) => {
                let principal = principal_with_role(ctx)?;
                if roles.iter().any(|r| r.as_str() == principal.role) {
                    Ok(())
                } else {
                    Err(CoreError::PermissionDenied {
                        required: roles.iter().map(|r| r.as_str().to_string()).collect(),
                        current: principal.role.clone(),
                    })
                }
            }
            Guard::MinRole(min_role) => {
                let principal = principal_with_role(ctx)?;
                if has_role_level(&principal.role, min_role.as_str()) {
                    Ok(())
                } else {
                    Err(CoreError::RoleLevelDenied {
                        required: min_role.as_str().to_string(),
                        current: principal.role.clone(),
                    })
                }
            }
            Guard::Permissions(required) => {
                let principal = principal_with_role(ctx)?;
                if required.iter().all(|p| has_permission(&principal.role, p)) {
                    Ok(())
                } else {
                    Err(CoreError::PermissionDenied {
                        required: required.clone(),
                        current: principal.role.clone(),
                    })
                }
            }
            Guard::OwnershipOrAdmin { param } => {
                let principal = ctx.principal.as_ref().ok_or(CoreError::AuthRequired)?;
                let is_owner = ctx
                    .params
                    .get(param)
                    .or_else(|| ctx.body_fields.get(param))
                    .is_some_and(|owner| *owner == principal.user_id);
                if is_owner || has_role_level(&principal.role, ROLE_ADMIN) {
                    Ok(())
                } else {
                    Err(CoreError::OwnershipDenied)
                }
            }
            Guard::Tenant => require_tenant(ctx).map(|_| ()),
            Guard::TenantAccess => validate_tenant_access(ctx, ctx.requested_tenant.as_deref()),
        }
    }
}

fn principal_with_role(ctx: &RequestContext) -> Result<&Principal, CoreError> {
    ctx.principal
        .as_ref()
        .filter(|p| !p.role.is_empty())
        .ok_or(CoreError::AuthRequired)
}

/// Apply guards in order; the first rejection wins.
pub fn run_guards(ctx: &RequestContext, guards: &[Guard]) -> Result<(), CoreError> {
    guards.iter().try_for_each(|guard| guard.check(ctx))
}

// ---------------------------------------------------------------------------
// Gateway helpers
// ---------------------------------------------------------------------------

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, CoreError> {
    let token = header
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .ok_or(CoreError::TokenMissing)?;
    if token.is_empty() || token.len() > MAX_TOKEN_LEN {
        return Err(CoreError::TokenInvalid);
    }
    Ok(token)
}

/// The bound tenant, or `TenantRequired`.
pub fn require_tenant(ctx: &RequestContext) -> Result<&str, CoreError> {
    ctx.tenant_id
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(CoreError::TenantRequired)
}

/// First non-empty tenant among path, body and query, in that order.
pub fn requested_tenant<'a>(
    path: Option<&'a str>,
    body: Option<&'a str>,
    query: Option<&'a str>,
) -> Option<&'a str> {
    [path, body, query]
        .into_iter()
        .flatten()
        .find(|t| !t.is_empty())
}

/// Reject when a requested tenant differs from the bound one.
///
/// No requested tenant means there is nothing to check.
pub fn validate_tenant_access(
    ctx: &RequestContext,
    requested: Option<&str>,
) -> Result<(), CoreError> {
    match requested.filter(|t| !t.is_empty()) {
        Some(requested) if ctx.tenant_id.as_deref() != Some(requested) => {
            Err(CoreError::TenantAccessDenied)
        }
        _ => Ok(()),
    }
}
