//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::handlers::auth;
use crate::middleware::auth::{authenticate, optional_auth};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register  -> register
/// POST /login     -> login
/// POST /refresh   -> refresh
/// POST /logout    -> logout (requires auth)
/// GET  /me        -> me (requires auth)
/// GET  /session   -> session (optional auth)
/// ```
pub fn router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));

    let optional = Router::new()
        .route("/session", get(auth::session))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_auth));

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .merge(protected)
        .merge(optional)
}
