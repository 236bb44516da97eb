//! Route definitions for rendered audio, mounted at `/audio-assets`.

use axum::routing::get;
use axum::Router;

use crate::handlers::audio_assets;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{reference}", get(audio_assets::get_audio_asset))
}
