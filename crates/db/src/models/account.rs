//! Account model, its store keys and create DTO.

use trancendos_core::types::Timestamp;

/// Primary key: accounts are unique per `(tenant_id, email)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountKey {
    pub tenant_id: String,
    pub email: String,
}

impl AccountKey {
    pub fn new(tenant_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            email: email.into(),
        }
    }
}

/// Secondary key used to find an account from token claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountIdKey {
    pub tenant_id: String,
    pub user_id: String,
}

impl AccountIdKey {
    pub fn new(tenant_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: String,
    pub email: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    pub tenant_id: String,
    pub role: String,
    /// Refresh tokens carrying a different version are rejected.
    pub token_version: u32,
    pub created_at: Timestamp,
}

impl Account {
    pub fn key(&self) -> AccountKey {
        AccountKey::new(&self.tenant_id, &self.email)
    }

    pub fn id_key(&self) -> AccountIdKey {
        AccountIdKey::new(&self.tenant_id, &self.user_id)
    }
}

/// DTO for creating a new account.
pub struct CreateAccount {
    pub user_id: String,
    pub email: String,
    pub password_hash: String,
    pub tenant_id: String,
    pub role: String,
}
