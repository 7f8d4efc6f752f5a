//! Role-based access control layer.
//!
//! [`enforce`] runs an ordered [`Guard`] chain against the request and stops
//! at the first rejection. Mount it with `route_layer` beneath
//! [`authenticate`](super::auth::authenticate) so the principal is bound first:
//!
//! ```ignore
//! Router::new()
//!     .route("/reports", get(reports))
//!     .route_layer(middleware::from_fn_with_state(
//!         chain([require_min_role(Role::Moderator)]),
//!         enforce,
//!     ))
//!     .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{Query, RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde::Deserialize;
use trancendos_core::guards::{requested_tenant, run_guards, Guard};
use trancendos_core::principal::{Principal, RequestContext, TenantId};

use crate::error::AppError;

/// Largest body buffered to look for guarded fields.
const BODY_LIMIT: usize = 64 * 1024;

/// Path parameter, body field and query key naming an explicitly requested tenant.
const TENANT_KEY: &str = "tenantId";

/// Collect guards into the shared state [`enforce`] expects.
pub fn chain(guards: impl IntoIterator<Item = Guard>) -> Arc<[Guard]> {
    guards.into_iter().collect()
}

#[derive(Debug, Default, Deserialize)]
struct TenantQuery {
    #[serde(rename = "tenantId")]
    tenant_id: Option<String>,
}

/// Apply the guard chain; the first rejection becomes the response.
pub async fn enforce(
    State(guards): State<Arc<[Guard]>>,
    path_params: Result<RawPathParams, RawPathParamsRejection>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let params: BTreeMap<String, String> = path_params
        .map(|raw| {
            raw.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();

    let wanted = body_keys(&guards, &params);
    let (req, body_fields) = if wanted.is_empty() {
        (req, BTreeMap::new())
    } else {
        read_body_fields(req, &wanted).await?
    };

    let query_tenant = Query::<TenantQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(q)| q.tenant_id);
    let requested = requested_tenant(
        params.get(TENANT_KEY).map(String::as_str),
        body_fields.get(TENANT_KEY).map(String::as_str),
        query_tenant.as_deref(),
    )
    .map(str::to_string);

    let ctx = RequestContext {
        principal: req.extensions().get::<Principal>().cloned(),
        tenant_id: req.extensions().get::<TenantId>().map(|t| t.0.clone()),
        ..RequestContext::default()
    }
    .with_params(params)
    .with_body_fields(body_fields)
    .with_requested_tenant(requested);

    if let Err(e) = run_guards(&ctx, &guards) {
        tracing::debug!(
            code = e.code(),
            path = %req.uri().path(),
            user_id = ctx.principal.as_ref().map(|p| p.user_id.as_str()),
            "Request rejected by guard"
        );
        return Err(e.into());
    }

    Ok(next.run(req).await)
}

/// Body fields the chain may consult: `tenantId` for tenant access, and any
/// ownership parameter the path does not already carry.
fn body_keys(guards: &[Guard], params: &BTreeMap<String, String>) -> Vec<String> {
    let mut keys = Vec::new();
    for guard in guards {
        let key = match guard {
            Guard::TenantAccess => TENANT_KEY,
            Guard::OwnershipOrAdmin { param } if !params.contains_key(param) => param.as_str(),
            _ => continue,
        };
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

/// Buffer a JSON body, pick out the string fields named in `keys`, then
/// hand the bytes back untouched.
async fn read_body_fields(
    req: Request,
    keys: &[String],
) -> Result<(Request, BTreeMap<String, String>), AppError> {
    let is_json = req
        .headers()
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    if !is_json {
        return Ok((req, BTreeMap::new()));
    }

    let (parts, body) = req.into_parts();
    let bytes = axum::body::to_bytes(body, BODY_LIMIT)
        .await
        .map_err(|_| AppError::BadRequest("Request body too large".into()))?;

    let fields = match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(serde_json::Value::Object(map)) => keys
            .iter()
            .filter_map(|k| {
                map.get(k)
                    .and_then(|v| v.as_str())
                    .map(|v| (k.clone(), v.to_string()))
            })
            .collect(),
        _ => BTreeMap::new(),
    };

    Ok((Request::from_parts(parts, Body::from(bytes)), fields))
}
