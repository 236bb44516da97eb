//! Repository for the `audio_generations` table.
//!
//! Every mutation after creation goes through [`AudioGenerationRepo::update_if_status`],
//! a single conditional UPDATE keyed on the observed status. Postgres row
//! locking makes it an atomic compare-and-set per record.

use pitch_core::audio_generation::GenerationStatus;
use pitch_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::audio_generation::{
    AudioGeneration, AudioGenerationPatch, CreateAudioGeneration,
};

/// Column list for `audio_generations` queries.
const COLUMNS: &str = "\
    id, owner_id, answers, status, failed_stage, script_text, \
    preview_audio_ref, hq_audio_ref, failure_reason, created_at, updated_at";

/// Maximum page size for listing.
pub const MAX_LIMIT: i64 = 100;

/// Default page size for listing.
pub const DEFAULT_LIMIT: i64 = 20;

/// Provides persistence for generation records.
pub struct AudioGenerationRepo;

impl AudioGenerationRepo {
    /// Insert a new record in `draft` status, returning the full row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateAudioGeneration,
    ) -> Result<AudioGeneration, sqlx::Error> {
        let query = format!(
            "INSERT INTO audio_generations (owner_id, answers, status) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AudioGeneration>(&query)
            .bind(&input.owner_id)
            .bind(Json(&input.answers))
            .bind(GenerationStatus::Draft.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a record by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<AudioGeneration>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM audio_generations WHERE id = $1");
        sqlx::query_as::<_, AudioGeneration>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's records, newest first.
    ///
    /// `limit` is clamped to `1..=MAX_LIMIT`; negative offsets become 0.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AudioGeneration>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audio_generations \
             WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, AudioGeneration>(&query)
            .bind(owner_id)
            .bind(limit.clamp(1, MAX_LIMIT))
            .bind(offset.max(0))
            .fetch_all(pool)
            .await
    }

    /// Apply `patch` only if the record is still in `expected` status.
    ///
    /// Returns `None` when no row matched: either the record does not exist
    /// or its status changed since it was read. Callers disambiguate with
    /// [`find_by_id`](Self::find_by_id).
    pub async fn update_if_status(
        pool: &PgPool,
        id: DbId,
        expected: GenerationStatus,
        patch: &AudioGenerationPatch,
    ) -> Result<Option<AudioGeneration>, sqlx::Error> {
        let query = format!(
            "UPDATE audio_generations SET \
                status = $3, \
                answers = COALESCE($4, answers), \
                script_text = COALESCE($5, script_text), \
                preview_audio_ref = COALESCE($6, preview_audio_ref), \
                hq_audio_ref = COALESCE($7, hq_audio_ref), \
                failed_stage = $8, \
                failure_reason = $9, \
                updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AudioGeneration>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(patch.status.as_str())
            .bind(patch.answers.as_ref().map(Json))
            .bind(patch.script_text.as_deref())
            .bind(patch.preview_audio_ref.as_deref())
            .bind(patch.hq_audio_ref.as_deref())
            .bind(patch.failure.as_ref().map(|f| f.stage.as_str()))
            .bind(patch.failure.as_ref().map(|f| f.reason.as_str()))
            .fetch_optional(pool)
            .await
    }
}
