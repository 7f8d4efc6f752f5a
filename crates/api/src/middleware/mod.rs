//! Request-level middleware and extractors.
//!
//! - [`auth`] -- bearer-token authentication and principal extractors.
//! - [`rbac`] -- ordered guard chains (roles, permissions, ownership, tenant).

pub mod auth;
pub mod rbac;
