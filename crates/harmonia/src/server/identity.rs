//! Caller identity
//!
//! Authentication happens upstream; the gateway forwards the authenticated
//! user id in the `x-user-id` header.

use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};
use uuid::Uuid;

use super::types::{ApiError, ApiFailure};

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl<S> FromRequestParts<S> for CurrentUser
where
  S: Send + Sync,
{
  type Rejection = ApiFailure;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .headers
      .get(USER_ID_HEADER)
      .and_then(|value| value.to_str().ok())
      .map(str::trim)
      .filter(|value| !value.is_empty())
      .map(|value| CurrentUser(value.to_string()))
      .ok_or_else(|| {
        ApiError::new("unauthenticated", "Missing authenticated user")
          .into_failure(StatusCode::UNAUTHORIZED, Uuid::new_v4())
      })
  }
}
