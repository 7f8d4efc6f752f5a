//! Trancendos auth API server library.
//!
//! Exposes the building blocks (config, state, error handling, middleware,
//! routes) so integration tests and the binary entrypoint can both use them.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
