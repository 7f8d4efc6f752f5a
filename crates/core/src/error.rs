use serde::Serialize;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Why a login attempt was rejected. Logged, never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialFailure {
    UnknownAccount,
    WrongPassword,
}

/// Why a refresh token was rejected. Logged, never shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshFailure {
    Expired,
    BadSignature,
    UnknownToken,
    UserMismatch,
    AccountMissing,
    VersionMismatch,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    ValidationFields(Vec<FieldError>),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("No token provided")]
    TokenMissing,

    #[error("Invalid token format")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Authentication required")]
    AuthRequired,

    #[error("Insufficient permissions")]
    PermissionDenied {
        required: Vec<String>,
        current: String,
    },

    #[error("Insufficient role level")]
    RoleLevelDenied { required: String, current: String },

    #[error("Access denied: ownership or admin role required")]
    OwnershipDenied,

    #[error("Tenant context required")]
    TenantRequired,

    #[error("Access denied to tenant resources")]
    TenantAccessDenied,

    #[error("Invalid credentials")]
    InvalidCredentials(CredentialFailure),

    #[error("Invalid refresh token")]
    InvalidRefreshToken(RefreshFailure),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable code rendered to clients.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Validation(_) | CoreError::ValidationFields(_) => "VALIDATION_ERROR",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::TokenMissing => "AUTH_TOKEN_MISSING",
            CoreError::TokenInvalid => "AUTH_TOKEN_INVALID",
            CoreError::TokenExpired => "AUTH_TOKEN_EXPIRED",
            CoreError::AuthFailed => "AUTH_FAILED",
            CoreError::AuthRequired => "AUTH_REQUIRED",
            CoreError::PermissionDenied { .. } => "PERMISSION_DENIED",
            CoreError::RoleLevelDenied { .. } => "ROLE_LEVEL_DENIED",
            CoreError::OwnershipDenied => "OWNERSHIP_DENIED",
            CoreError::TenantRequired => "TENANT_REQUIRED",
            CoreError::TenantAccessDenied => "TENANT_ACCESS_DENIED",
            CoreError::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            CoreError::InvalidRefreshToken(_) => "INVALID_REFRESH_TOKEN",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
