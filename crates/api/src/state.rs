use std::sync::Arc;

use pitch_core::assets::AssetStore;
use pitch_pipeline::GenerationWorkflow;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database pool, or `None` when records are kept in memory.
    pub pool: Option<pitch_db::DbPool>,
    /// The generation workflow controller.
    pub workflow: Arc<GenerationWorkflow>,
    /// Rendered audio, served by the asset route.
    pub assets: Arc<dyn AssetStore>,
}
