//! Storage layer for accounts and refresh-token records.
//!
//! Repositories talk to an [`AuthStore`], a bundle of keyed stores behind the
//! [`KeyValueStore`] capability trait. The bundled [`MemoryStore`] keeps
//! everything in process memory; nothing survives a restart.

pub mod models;
pub mod repositories;
pub mod store;

use std::sync::Arc;

use models::account::{Account, AccountIdKey, AccountKey};
use models::refresh_token::RefreshTokenRecord;
pub use store::{DbError, KeyValueStore, MemoryStore};

/// The keyed stores backing the account directory.
///
/// Cheaply cloneable; each store sits behind an `Arc`.
#[derive(Clone)]
pub struct AuthStore {
    /// Accounts keyed by `(tenant_id, email)`.
    pub accounts: Arc<dyn KeyValueStore<AccountKey, Account>>,
    /// Secondary index from `(tenant_id, user_id)` to the account key.
    pub account_ids: Arc<dyn KeyValueStore<AccountIdKey, AccountKey>>,
    /// Refresh-token records keyed by the raw token string.
    pub refresh_tokens: Arc<dyn KeyValueStore<String, RefreshTokenRecord>>,
}

impl AuthStore {
    /// Volatile stores living for the lifetime of the process.
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(MemoryStore::new()),
            account_ids: Arc::new(MemoryStore::new()),
            refresh_tokens: Arc::new(MemoryStore::new()),
        }
    }
}

/// Verify the stores respond.
pub async fn health_check(store: &AuthStore) -> Result<(), DbError> {
    store.accounts.len().await?;
    store.refresh_tokens.len().await?;
    Ok(())
}
