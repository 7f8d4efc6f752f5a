//! Request body extractors that reject through [`AppError`].

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON request body.
///
/// Behaves like [`axum::Json`] but malformed, mistyped or non-JSON bodies
/// become a 400 with the usual `{ success, error, code }` envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
