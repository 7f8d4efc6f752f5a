//! Domain logic for tenant-scoped authentication and authorization.
//!
//! Nothing in this crate performs I/O: sanitization, the role hierarchy,
//! request guards and the error taxonomy are all pure.

pub mod error;
pub mod guards;
pub mod principal;
pub mod roles;
pub mod sanitize;
pub mod types;
