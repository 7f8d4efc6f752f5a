use std::sync::Arc;

use crate::auth::directory::AccountDirectory;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Keyed stores for accounts and refresh tokens.
    pub store: trancendos_db::AuthStore,
    /// Server configuration, including the JWT settings the auth layer verifies with.
    pub config: Arc<ServerConfig>,
    /// Registration, login, refresh and logout.
    pub directory: Arc<AccountDirectory>,
}

impl AppState {
    /// Wire the directory to `store` using the JWT settings from `config`.
    pub fn new(store: trancendos_db::AuthStore, config: ServerConfig) -> Self {
        let directory = AccountDirectory::new(store.clone(), Arc::new(config.jwt.clone()));
        Self {
            store,
            config: Arc::new(config),
            directory: Arc::new(directory),
        }
    }
}
