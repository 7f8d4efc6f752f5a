//! Repository for refresh-token records.

use trancendos_core::types::Timestamp;

use crate::models::refresh_token::RefreshTokenRecord;
use crate::store::DbError;
use crate::AuthStore;

/// Provides CRUD operations for refresh-token records.
pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    /// Record an issued refresh token.
    pub async fn create(
        store: &AuthStore,
        token: &str,
        record: RefreshTokenRecord,
    ) -> Result<(), DbError> {
        store.refresh_tokens.put(token.to_string(), record).await
    }

    /// Look up the record for a raw refresh token.
    pub async fn find(store: &AuthStore, token: &str) -> Result<Option<RefreshTokenRecord>, DbError> {
        store.refresh_tokens.get(&token.to_string()).await
    }

    /// Delete the record for a token. Deleting an absent token is not an error.
    pub async fn delete(store: &AuthStore, token: &str) -> Result<bool, DbError> {
        store.refresh_tokens.delete(&token.to_string()).await
    }

    /// Remove every record whose `expires_at` is at or before `now`.
    pub async fn delete_expired(store: &AuthStore, now: Timestamp) -> Result<usize, DbError> {
        store
            .refresh_tokens
            .retain(&|_, record| record.expires_at > now)
            .await
    }
}
