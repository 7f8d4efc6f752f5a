//! Refresh-token record model.

use trancendos_core::types::Timestamp;

/// Server-side record of an issued refresh token, keyed by the raw token.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub user_id: String,
    pub tenant_id: String,
    pub issued_at: Timestamp,
    /// Mirrors the token's `exp` claim; used only for sweeping.
    pub expires_at: Timestamp,
}
