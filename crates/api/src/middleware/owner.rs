//! Caller identity extractor.
//!
//! Authentication happens upstream at the identity-provider gateway, which
//! forwards the verified account id in the `X-Owner-Id` header. This
//! extractor only requires that the header is present and well formed.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pitch_core::error::CoreError;

use crate::error::AppError;

/// Header carrying the caller's account id.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Longest accepted account id.
const MAX_OWNER_ID_LENGTH: usize = 128;

/// The calling account. Records are only visible to their owner.
///
/// ```ignore
/// async fn my_handler(owner: OwnerId) -> AppResult<Json<()>> {
///     tracing::info!(owner_id = %owner.0, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for OwnerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Missing X-Owner-Id header".into()))
            })?;

        if value.len() > MAX_OWNER_ID_LENGTH || value.chars().any(char::is_control) {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Malformed X-Owner-Id header".into(),
            )));
        }

        Ok(OwnerId(value.to_string()))
    }
}
