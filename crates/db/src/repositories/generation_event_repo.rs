//! Repository for the `generation_events` audit trail.

use pitch_core::types::DbId;
use sqlx::PgPool;

use crate::models::generation_event::GenerationEvent;

const COLUMNS: &str = "id, generation_id, event_type, owner_id, payload, created_at";

pub struct GenerationEventRepo;

impl GenerationEventRepo {
    /// Append an event, returning its id.
    pub async fn insert(
        pool: &PgPool,
        generation_id: DbId,
        event_type: &str,
        owner_id: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        let row: (DbId,) = sqlx::query_as(
            "INSERT INTO generation_events (generation_id, event_type, owner_id, payload) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(generation_id)
        .bind(event_type)
        .bind(owner_id)
        .bind(payload)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// All events for one record, oldest first.
    pub async fn list_for_generation(
        pool: &PgPool,
        generation_id: DbId,
    ) -> Result<Vec<GenerationEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM generation_events \
             WHERE generation_id = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, GenerationEvent>(&query)
            .bind(generation_id)
            .fetch_all(pool)
            .await
    }
}
