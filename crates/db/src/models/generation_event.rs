//! Generation lifecycle event model.

use pitch_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `generation_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GenerationEvent {
    pub id: DbId,
    pub generation_id: DbId,
    pub event_type: String,
    pub owner_id: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}
