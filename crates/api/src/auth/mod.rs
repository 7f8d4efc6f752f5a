//! Authentication primitives and the account directory built on them.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- tenant-scoped access and refresh tokens.
//! - [`directory`] -- registration, login, refresh and logout.

pub mod directory;
pub mod jwt;
pub mod password;
