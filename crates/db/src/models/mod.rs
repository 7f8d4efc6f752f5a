//! Stored record types and their create DTOs.

pub mod account;
pub mod refresh_token;
