//! Caller identity extractor.
//!
//! Authentication happens upstream; the edge proxy forwards the
//! authenticated user's ID in the `X-User-Id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::UserId;
use crate::error::ServiceError;

/// Header carrying the authenticated user's UUID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user making the request.
///
/// Rejects with [`ServiceError::Unauthenticated`] if the header is missing
/// or is not a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub UserId);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|raw| raw.trim().parse::<UserId>().ok())
            .map(Caller)
            .ok_or(ServiceError::Unauthenticated)
    }
}
