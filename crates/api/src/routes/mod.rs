pub mod audio_assets;
pub mod audio_generation;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /audio-generations                       list, create
/// /audio-generations/questions             wizard questions
/// /audio-generations/{id}                  get
/// /audio-generations/{id}/answers          replace answers (PUT, draft only)
/// /audio-generations/{id}/script           request (POST), edit (PUT)
/// /audio-generations/{id}/script/retry     retry failed script (POST)
/// /audio-generations/{id}/preview          request preview audio (POST)
/// /audio-generations/{id}/preview/retry    retry failed preview (POST)
/// /audio-generations/{id}/hq               request HQ audio (POST)
/// /audio-generations/{id}/hq/retry         retry failed HQ audio (POST)
///
/// /audio-assets/{reference}                rendered audio bytes
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/audio-generations", audio_generation::router())
        .nest("/audio-assets", audio_assets::router())
}
