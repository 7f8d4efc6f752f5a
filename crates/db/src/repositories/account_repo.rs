//! Repository for accounts and their user-id index.

use chrono::Utc;

use crate::models::account::{Account, AccountIdKey, AccountKey, CreateAccount};
use crate::store::DbError;
use crate::AuthStore;

/// Provides create and lookup operations for accounts.
pub struct AccountRepo;

impl AccountRepo {
    /// Insert a new account with `token_version = 0`.
    ///
    /// The `(tenant_id, email)` uniqueness check and the insert are a single
    /// atomic step; a second caller with the same key gets
    /// [`DbError::Duplicate`].
    pub async fn create(store: &AuthStore, input: &CreateAccount) -> Result<Account, DbError> {
        let account = Account {
            user_id: input.user_id.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            tenant_id: input.tenant_id.clone(),
            role: input.role.clone(),
            token_version: 0,
            created_at: Utc::now(),
        };

        let inserted = store
            .accounts
            .insert_if_absent(account.key(), account.clone())
            .await?;
        if !inserted {
            return Err(DbError::Duplicate(format!(
                "account {}:{}",
                account.tenant_id, account.email
            )));
        }

        store.account_ids.put(account.id_key(), account.key()).await?;
        tracing::debug!(user_id = %account.user_id, tenant_id = %account.tenant_id, "Account stored");
        Ok(account)
    }

    /// Find an account by tenant and normalized email.
    pub async fn find_by_email(
        store: &AuthStore,
        tenant_id: &str,
        email: &str,
    ) -> Result<Option<Account>, DbError> {
        store.accounts.get(&AccountKey::new(tenant_id, email)).await
    }

    /// Find an account by tenant and user id.
    pub async fn find_by_id(
        store: &AuthStore,
        tenant_id: &str,
        user_id: &str,
    ) -> Result<Option<Account>, DbError> {
        let Some(key) = store
            .account_ids
            .get(&AccountIdKey::new(tenant_id, user_id))
            .await?
        else {
            return Ok(None);
        };
        let account = store.accounts.get(&key).await?;
        Ok(account.filter(|a| a.user_id == user_id))
    }
}
