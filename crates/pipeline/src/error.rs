use pitch_core::assets::AssetError;
use pitch_core::audio_generation::{GenerationStatus, TransitionError};
use pitch_core::error::CoreError;
use pitch_core::types::DbId;
use pitch_core::upstream::UpstreamError;

use crate::store::StoreError;

/// Everything a workflow operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The record changed underneath an in-flight stage before its result
    /// could be written.
    #[error("Generation {id} is no longer '{expected}'")]
    PreconditionFailed {
        id: DbId,
        expected: GenerationStatus,
    },

    /// The stage's outbound call failed. The record has been marked failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Rendered audio could not be stored. The record has been marked failed.
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A store refused a write that would break the record invariants.
    #[error("Record constraint violated: {0}")]
    Constraint(String),
}

impl From<StoreError> for GenerationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::Core(CoreError::NotFound {
                entity: "AudioGeneration",
                id,
            }),
            StoreError::PreconditionFailed { id, expected } => {
                Self::PreconditionFailed { id, expected }
            }
            StoreError::Constraint(msg) => Self::Constraint(msg),
            StoreError::Database(e) => Self::Database(e),
        }
    }
}
