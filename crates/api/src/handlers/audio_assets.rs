//! Serves rendered audio by reference.
//!
//! References are unguessable (`<uuid>.<ext>`) and only ever handed out on
//! the owner's record, so the route needs no owner header and can be used
//! directly as an `<audio src>`.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::error::AppResult;
use crate::state::AppState;

/// Assets are immutable once written.
const CACHE_FOREVER: &str = "private, max-age=31536000, immutable";

/// GET /audio-assets/{reference}
pub async fn get_audio_asset(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> AppResult<Response> {
    let asset = state.assets.load(&reference).await?;

    Ok((
        [
            (CONTENT_TYPE, asset.content_type.to_string()),
            (CACHE_CONTROL, CACHE_FOREVER.to_string()),
        ],
        Body::from(asset.bytes),
    )
        .into_response())
}
