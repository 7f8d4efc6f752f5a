//! HTTP request handlers.

pub mod auth;
pub mod tenant_users;
