//! Route definitions for generation records.
//!
//! Mounted at `/audio-generations` by `api_routes()`. Every route except
//! `/questions` requires the `X-Owner-Id` header.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::audio_generation;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(audio_generation::list_generations).post(audio_generation::create_draft),
        )
        .route("/questions", get(audio_generation::list_questions))
        .route("/{id}", get(audio_generation::get_generation))
        .route("/{id}/answers", put(audio_generation::replace_answers))
        .route(
            "/{id}/script",
            post(audio_generation::request_script).put(audio_generation::edit_script),
        )
        .route("/{id}/script/retry", post(audio_generation::retry_script))
        .route("/{id}/preview", post(audio_generation::request_preview))
        .route("/{id}/preview/retry", post(audio_generation::retry_preview))
        .route("/{id}/hq", post(audio_generation::request_hq))
        .route("/{id}/hq/retry", post(audio_generation::retry_hq))
}
