//! Generation record store contract.
//!
//! The workflow never holds a lock on a record. Instead every status change
//! goes through [`GenerationStore::update_if_status`], an atomic
//! compare-and-set keyed on the status the caller last observed. Persisting
//! a `_generating` status this way turns the status column into the
//! record's mutual-exclusion flag.

use async_trait::async_trait;
use pitch_core::audio_generation::GenerationStatus;
use pitch_core::types::DbId;
use pitch_db::models::audio_generation::{
    AudioGeneration, AudioGenerationPatch, CreateAudioGeneration,
};
use pitch_db::repositories::AudioGenerationRepo;
use pitch_db::DbPool;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Generation {0} not found")]
    NotFound(DbId),

    /// The record exists but is no longer in the expected status.
    #[error("Generation {id} is no longer in status '{expected}'")]
    PreconditionFailed {
        id: DbId,
        expected: GenerationStatus,
    },

    #[error("Record constraint violated: {0}")]
    Constraint(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for generation records.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Insert a new `draft` record.
    async fn create(&self, input: &CreateAudioGeneration) -> Result<AudioGeneration, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<AudioGeneration>, StoreError>;

    /// An owner's records, newest first. `limit` is clamped to a sane page size.
    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AudioGeneration>, StoreError>;

    /// Apply `patch` only if the record is currently in `expected` status.
    ///
    /// Atomic per record. Fails with [`StoreError::PreconditionFailed`] when
    /// the status no longer matches and [`StoreError::NotFound`] when the
    /// record does not exist.
    async fn update_if_status(
        &self,
        id: DbId,
        expected: GenerationStatus,
        patch: &AudioGenerationPatch,
    ) -> Result<AudioGeneration, StoreError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`GenerationStore`] backed by the `audio_generations` table.
#[derive(Clone)]
pub struct PgGenerationStore {
    pool: DbPool,
}

impl PgGenerationStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map CHECK-constraint violations to [`StoreError::Constraint`].
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_check_violation() {
            return StoreError::Constraint(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl GenerationStore for PgGenerationStore {
    async fn create(&self, input: &CreateAudioGeneration) -> Result<AudioGeneration, StoreError> {
        AudioGenerationRepo::create(&self.pool, input)
            .await
            .map_err(map_db_error)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<AudioGeneration>, StoreError> {
        Ok(AudioGenerationRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AudioGeneration>, StoreError> {
        Ok(AudioGenerationRepo::list_by_owner(&self.pool, owner_id, limit, offset).await?)
    }

    async fn update_if_status(
        &self,
        id: DbId,
        expected: GenerationStatus,
        patch: &AudioGenerationPatch,
    ) -> Result<AudioGeneration, StoreError> {
        let updated = AudioGenerationRepo::update_if_status(&self.pool, id, expected, patch)
            .await
            .map_err(map_db_error)?;

        match updated {
            Some(row) => Ok(row),
            // Zero rows: tell a missing record apart from a lost race.
            None => match AudioGenerationRepo::find_by_id(&self.pool, id).await? {
                Some(_) => Err(StoreError::PreconditionFailed { id, expected }),
                None => Err(StoreError::NotFound(id)),
            },
        }
    }
}
