//! Tenant-scoped JWT access and refresh tokens.
//!
//! Both token kinds are HS256-signed with separate secrets. Every token
//! carries the fixed issuer [`ISSUER`] and uses its tenant id as the audience.
//! A random `jti` makes each issued token unique.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use trancendos_core::error::{CoreError, RefreshFailure};
use trancendos_core::roles::ROLE_USER;
use trancendos_core::sanitize::{sanitize_role, MAX_EMAIL_LEN, MAX_ID_LEN};
use uuid::Uuid;

use crate::config::{parse_duration_secs, ConfigError};

/// Issuer claim stamped on and required of every token.
pub const ISSUER: &str = "trancendos-auth";

/// Maximum length of the role claim.
pub const MAX_ROLE_LEN: usize = 50;

/// Default access token lifetime.
const DEFAULT_ACCESS_EXPIRY: &str = "15m";
/// Default refresh token lifetime.
const DEFAULT_REFRESH_EXPIRY: &str = "7d";

/// Length in bytes of a generated fallback secret.
const GENERATED_SECRET_BYTES: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("userId and tenantId are required")]
    MissingIdentity,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Refresh token expired")]
    RefreshExpired,

    #[error("Invalid refresh token")]
    RefreshInvalid,

    #[error("Token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

impl From<TokenError> for CoreError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MissingIdentity => CoreError::Validation(err.to_string()),
            TokenError::Expired => CoreError::TokenExpired,
            TokenError::Invalid => CoreError::TokenInvalid,
            TokenError::RefreshExpired => CoreError::InvalidRefreshToken(RefreshFailure::Expired),
            TokenError::RefreshInvalid => {
                CoreError::InvalidRefreshToken(RefreshFailure::BadSignature)
            }
            TokenError::Encoding(e) => CoreError::Internal(format!("Token encoding failed: {e}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Signing secrets and lifetimes for both token kinds.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret for access tokens.
    pub access_secret: String,
    /// HMAC-SHA256 secret for refresh tokens.
    pub refresh_secret: String,
    /// Access token lifetime in seconds (default: 15 minutes).
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds (default: 7 days).
    pub refresh_token_ttl_secs: i64,
}

impl JwtConfig {
    /// Load JWT configuration through `lookup` (normally `std::env::var`).
    ///
    /// | Env Var              | Default                        |
    /// |----------------------|--------------------------------|
    /// | `JWT_SECRET`         | random, lost on restart        |
    /// | `JWT_REFRESH_SECRET` | random, lost on restart        |
    /// | `JWT_EXPIRY`         | `15m`                          |
    /// | `JWT_REFRESH_EXPIRY` | `7d`                           |
    ///
    /// An unset secret is replaced by a freshly generated one and a warning is
    /// logged. When `production` is set, an unset secret is an error instead.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        production: bool,
    ) -> Result<Self, ConfigError> {
        let access_secret = secret_or_generated(&lookup, "JWT_SECRET", production)?;
        let refresh_secret = secret_or_generated(&lookup, "JWT_REFRESH_SECRET", production)?;

        let access_token_ttl_secs = parse_duration_secs(
            "JWT_EXPIRY",
            &lookup("JWT_EXPIRY").unwrap_or_else(|| DEFAULT_ACCESS_EXPIRY.into()),
        )?;
        let refresh_token_ttl_secs = parse_duration_secs(
            "JWT_REFRESH_EXPIRY",
            &lookup("JWT_REFRESH_EXPIRY").unwrap_or_else(|| DEFAULT_REFRESH_EXPIRY.into()),
        )?;

        Ok(Self {
            access_secret,
            refresh_secret,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
        })
    }
}

fn secret_or_generated(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    production: bool,
) -> Result<String, ConfigError> {
    match lookup(var).filter(|s| !s.is_empty()) {
        Some(secret) => Ok(secret),
        None if production => Err(ConfigError::MissingSecret(var)),
        None => {
            tracing::warn!(
                var,
                "Signing secret not set; using an ephemeral secret. Tokens will not survive a restart"
            );
            Ok(generate_secret())
        }
    }
}

/// Random hex-encoded secret.
fn generate_secret() -> String {
    let mut bytes = [0u8; GENERATED_SECRET_BYTES];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

/// Input to token generation.
#[derive(Debug, Clone, Default)]
pub struct TokenPayload {
    pub user_id: String,
    pub tenant_id: String,
    pub role: Option<String>,
    pub email: Option<String>,
    pub token_version: Option<u32>,
}

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub user_id: String,
    pub tenant_id: String,
    pub role: String,
    pub email: String,
    pub iss: String,
    /// Audience; always equal to `tenant_id`.
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Claims embedded in every refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshClaims {
    pub user_id: String,
    pub tenant_id: String,
    pub token_version: u32,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

fn truncate(value: &str, max_len: usize) -> String {
    value.chars().take(max_len).collect()
}

fn require_identity(payload: &TokenPayload) -> Result<(String, String), TokenError> {
    if payload.user_id.is_empty() || payload.tenant_id.is_empty() {
        return Err(TokenError::MissingIdentity);
    }
    Ok((
        truncate(&payload.user_id, MAX_ID_LEN),
        truncate(&payload.tenant_id, MAX_ID_LEN),
    ))
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Generate an access token for `payload`.
///
/// Fails with [`TokenError::MissingIdentity`] if `user_id` or `tenant_id` is
/// empty. Role defaults to `user`; all fields are truncated to their limits.
pub fn generate_access_token(payload: &TokenPayload, config: &JwtConfig) -> Result<String, TokenError> {
    let (user_id, tenant_id) = require_identity(payload)?;
    let role = payload
        .role
        .as_deref()
        .filter(|r| !r.is_empty())
        .map(|r| sanitize_role(&truncate(r, MAX_ROLE_LEN)))
        .unwrap_or(ROLE_USER);
    let now = Utc::now().timestamp();

    let claims = AccessClaims {
        role: role.to_string(),
        email: truncate(payload.email.as_deref().unwrap_or_default(), MAX_EMAIL_LEN),
        iss: ISSUER.to_string(),
        aud: tenant_id.clone(),
        iat: now,
        exp: now + config.access_token_ttl_secs,
        jti: Uuid::new_v4().to_string(),
        user_id,
        tenant_id,
    };

    Ok(encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.access_secret.as_bytes()),
    )?)
}

/// Generate a refresh token for `payload`. `token_version` defaults to 0.
pub fn generate_refresh_token(
    payload: &TokenPayload,
    config: &JwtConfig,
) -> Result<String, TokenError> {
    let (user_id, tenant_id) = require_identity(payload)?;
    let now = Utc::now().timestamp();

    let claims = RefreshClaims {
        token_version: payload.token_version.unwrap_or(0),
        iss: ISSUER.to_string(),
        aud: tenant_id.clone(),
        iat: now,
        exp: now + config.refresh_token_ttl_secs,
        jti: Uuid::new_v4().to_string(),
        user_id,
        tenant_id,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.refresh_secret.as_bytes()),
    )?)
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);
    // The audience is per-tenant; it is compared against the tenant claim below.
    validation.validate_aud = false;
    validation.leeway = 0;
    validation
}

/// Verify an access token's signature, issuer, expiry and audience.
pub fn verify_access_token(token: &str, config: &JwtConfig) -> Result<AccessClaims, TokenError> {
    let data = decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(config.access_secret.as_bytes()),
        &validation(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    if data.claims.aud != data.claims.tenant_id {
        return Err(TokenError::Invalid);
    }
    Ok(data.claims)
}

/// Verify a refresh token against the refresh secret.
pub fn verify_refresh_token(token: &str, config: &JwtConfig) -> Result<RefreshClaims, TokenError> {
    let data = decode::<RefreshClaims>(
        token,
        &DecodingKey::from_secret(config.refresh_secret.as_bytes()),
        &validation(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::RefreshExpired,
        _ => TokenError::RefreshInvalid,
    })?;

    if data.claims.aud != data.claims.tenant_id {
        return Err(TokenError::RefreshInvalid);
    }
    Ok(data.claims)
}

/// Decode a token's claims without checking signature or expiry.
///
/// Diagnostics only: the result must never feed a trust decision.
pub fn decode_token(token: &str) -> Option<serde_json::Value> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<serde_json::Value>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}
