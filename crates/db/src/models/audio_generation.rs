//! Audio generation record model and DTOs.

use pitch_core::audio_generation::{GenerationStatus, RecordShape, Stage};
use pitch_core::error::CoreError;
use pitch_core::types::{DbId, Timestamp};
use pitch_core::wizard::WizardAnswers;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `audio_generations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AudioGeneration {
    pub id: DbId,
    pub owner_id: String,
    pub answers: Json<WizardAnswers>,
    pub status: String,
    pub failed_stage: Option<String>,
    pub script_text: Option<String>,
    pub preview_audio_ref: Option<String>,
    pub hq_audio_ref: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AudioGeneration {
    /// Parsed `status` column.
    pub fn status(&self) -> Result<GenerationStatus, CoreError> {
        GenerationStatus::from_str_db(&self.status)
    }

    /// Parsed `failed_stage` column.
    pub fn failed_stage(&self) -> Result<Option<Stage>, CoreError> {
        self.failed_stage
            .as_deref()
            .map(Stage::from_str_db)
            .transpose()
    }

    /// Borrow the invariant-bearing fields for validation.
    pub fn shape(&self) -> Result<RecordShape<'_>, CoreError> {
        Ok(RecordShape {
            status: self.status()?,
            failed_stage: self.failed_stage()?,
            script_text: self.script_text.as_deref(),
            preview_audio_ref: self.preview_audio_ref.as_deref(),
            hq_audio_ref: self.hq_audio_ref.as_deref(),
            failure_reason: self.failure_reason.as_deref(),
        })
    }
}

/// DTO for creating a new draft record.
#[derive(Debug, Clone)]
pub struct CreateAudioGeneration {
    pub owner_id: String,
    pub answers: WizardAnswers,
}

/// A failed stage attempt to record on the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
}

/// Conditional update applied by [`AudioGenerationRepo::update_if_status`].
///
/// `status` is always written. Artifact fields are written only when
/// `Some` and otherwise left untouched. The failure pair is always
/// written, so any patch that does not carry a failure clears it.
///
/// [`AudioGenerationRepo::update_if_status`]: crate::repositories::AudioGenerationRepo::update_if_status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioGenerationPatch {
    pub status: GenerationStatus,
    pub answers: Option<WizardAnswers>,
    pub script_text: Option<String>,
    pub preview_audio_ref: Option<String>,
    pub hq_audio_ref: Option<String>,
    pub failure: Option<StageFailure>,
}

impl AudioGenerationPatch {
    /// Move to `status`, leaving every other field as is (and clearing any failure).
    pub fn to_status(status: GenerationStatus) -> Self {
        Self {
            status,
            answers: None,
            script_text: None,
            preview_audio_ref: None,
            hq_audio_ref: None,
            failure: None,
        }
    }

    /// Move to `failed`, recording which stage failed and why.
    pub fn failed(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            failure: Some(StageFailure {
                stage,
                reason: reason.into(),
            }),
            ..Self::to_status(GenerationStatus::Failed)
        }
    }

    pub fn with_answers(mut self, answers: WizardAnswers) -> Self {
        self.answers = Some(answers);
        self
    }

    pub fn with_script_text(mut self, text: impl Into<String>) -> Self {
        self.script_text = Some(text.into());
        self
    }

    pub fn with_preview_audio_ref(mut self, reference: impl Into<String>) -> Self {
        self.preview_audio_ref = Some(reference.into());
        self
    }

    pub fn with_hq_audio_ref(mut self, reference: impl Into<String>) -> Self {
        self.hq_audio_ref = Some(reference.into());
        self
    }
}

/// Query parameters for listing an owner's records.
#[derive(Debug, Default, Deserialize)]
pub struct AudioGenerationListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
