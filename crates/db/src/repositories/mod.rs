//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async operations that
//! accept `&AuthStore` as the first argument.

pub mod account_repo;
pub mod refresh_token_repo;

pub use account_repo::AccountRepo;
pub use refresh_token_repo::RefreshTokenRepo;
