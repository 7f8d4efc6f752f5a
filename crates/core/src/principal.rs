//! Verified identity and per-request authorization context.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::sanitize::{sanitize_input, sanitize_role, DEFAULT_MAX_LEN};

/// Identity attached to an authenticated request.
///
/// Built only from verified token claims and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: String,
    pub tenant_id: String,
    pub role: String,
    pub email: String,
}

impl Principal {
    /// Build a principal from raw claim values, sanitizing each field.
    ///
    /// The role is normalized against the role set; unknown names become `user`.
    pub fn from_claims(user_id: &str, tenant_id: &str, role: &str, email: &str) -> Self {
        Self {
            user_id: sanitize_input(Some(user_id), DEFAULT_MAX_LEN),
            tenant_id: sanitize_input(Some(tenant_id), DEFAULT_MAX_LEN),
            role: sanitize_role(role).to_string(),
            email: sanitize_input(Some(email), DEFAULT_MAX_LEN),
        }
    }
}

/// Tenant scope bound to a request once authentication succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantId(pub String);

/// Everything a request guard may inspect.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub tenant_id: Option<String>,
    /// Path parameters of the matched route.
    pub params: BTreeMap<String, String>,
    /// String fields read from a JSON request body.
    pub body_fields: BTreeMap<String, String>,
    /// Tenant explicitly named by the request (path, body or query).
    pub requested_tenant: Option<String>,
}

impl RequestContext {
    /// Context for an authenticated request; the tenant scope follows the principal.
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            tenant_id: Some(principal.tenant_id.clone()),
            principal: Some(principal),
            ..Self::default()
        }
    }

    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_body_fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body_fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn with_requested_tenant(mut self, tenant: Option<String>) -> Self {
        self.requested_tenant = tenant;
        self
    }
}
