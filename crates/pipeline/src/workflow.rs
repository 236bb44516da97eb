//! Generation workflow controller.
//!
//! [`GenerationWorkflow`] is the only component that changes a record's
//! status. Every stage trigger follows the same sequence:
//!
//! 1. Read the record and check the transition is allowed.
//! 2. Claim the record by compare-and-setting the stage's `_generating`
//!    status. Losing the claim means another trigger is in flight.
//! 3. Make exactly one outbound call (AI script or TTS).
//! 4. Compare-and-set the `_ready` status with the artifact, or `failed`
//!    with a categorized reason.
//!
//! Steps 3 and 4 run on a spawned task, so a caller that stops waiting
//! (client disconnect, request timeout) cannot leave a record stuck in
//! `_generating`. Nothing is retried automatically; a failed stage waits
//! for an explicit retry from the caller.

use std::sync::Arc;

use pitch_core::assets::{AssetError, AssetStore};
use pitch_core::audio_generation::{
    self, check_edit, plan_transition, GenerationAction, GenerationStatus, Stage,
    TransitionError, ASSET_STORAGE_CATEGORY,
};
use pitch_core::error::CoreError;
use pitch_core::prompt::build_script_prompt;
use pitch_core::types::DbId;
use pitch_core::upstream::{ScriptGenerator, UpstreamError, VoiceProfile, VoiceSynthesizer};
use pitch_core::wizard::{self, WizardAnswers};
use pitch_db::models::audio_generation::{
    AudioGeneration, AudioGenerationPatch, CreateAudioGeneration,
};
use pitch_events::bus::{EVENT_ANSWERS_REPLACED, EVENT_CREATED, EVENT_SCRIPT_EDITED};
use pitch_events::{EventBus, LifecycleEvent};

use crate::error::GenerationError;
use crate::store::{GenerationStore, StoreError};

/// Entity name used in not-found errors.
const ENTITY: &str = "AudioGeneration";

/// Service name for script responses that arrive empty.
const SCRIPT_SERVICE: &str = "script writer";

/// The TTS profile used by each audio stage.
#[derive(Debug, Clone)]
pub struct VoiceProfiles {
    pub preview: VoiceProfile,
    pub hq: VoiceProfile,
}

impl VoiceProfiles {
    fn for_stage(&self, stage: Stage) -> Option<&VoiceProfile> {
        match stage {
            Stage::Script => None,
            Stage::Preview => Some(&self.preview),
            Stage::Hq => Some(&self.hq),
        }
    }
}

/// Why a claimed stage attempt did not produce an artifact.
enum AttemptError {
    /// The claimed record could not feed the stage (answers or script unusable).
    Input(CoreError),
    Upstream(UpstreamError),
    Asset(AssetError),
}

impl AttemptError {
    /// Reason persisted on the failed record, prefixed with its category.
    fn reason(&self, stage: Stage) -> String {
        match self {
            Self::Upstream(e) => audio_generation::upstream_failure_reason(stage, e),
            Self::Asset(e) => format!(
                "{ASSET_STORAGE_CATEGORY}: {} could not be stored: {e}",
                stage.label()
            ),
            Self::Input(e) => format!("InvalidInput: {} generation failed: {e}", stage.label()),
        }
    }
}

impl From<AttemptError> for GenerationError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::Input(e) => Self::Core(e),
            AttemptError::Upstream(e) => Self::Upstream(e),
            AttemptError::Asset(e) => Self::Asset(e),
        }
    }
}

/// Drives generation records through their stages.
///
/// Cheap to clone; every collaborator sits behind an `Arc`.
#[derive(Clone)]
pub struct GenerationWorkflow {
    store: Arc<dyn GenerationStore>,
    scripts: Arc<dyn ScriptGenerator>,
    voices: Arc<dyn VoiceSynthesizer>,
    assets: Arc<dyn AssetStore>,
    profiles: VoiceProfiles,
    events: Arc<EventBus>,
}

impl GenerationWorkflow {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        scripts: Arc<dyn ScriptGenerator>,
        voices: Arc<dyn VoiceSynthesizer>,
        assets: Arc<dyn AssetStore>,
        profiles: VoiceProfiles,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            store,
            scripts,
            voices,
            assets,
            profiles,
            events,
        }
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    /// Validate the answers and persist a new `draft` record.
    ///
    /// Incomplete answers fail with [`CoreError::IncompleteAnswers`] and
    /// nothing is persisted.
    pub async fn create_draft(
        &self,
        owner_id: &str,
        answers: &WizardAnswers,
    ) -> Result<AudioGeneration, GenerationError> {
        wizard::validate_answers(answers)?;

        let record = self
            .store
            .create(&CreateAudioGeneration {
                owner_id: owner_id.to_string(),
                answers: wizard::normalize_answers(answers),
            })
            .await?;

        tracing::info!(generation_id = record.id, owner_id, "Generation draft created");
        self.publish(LifecycleEvent::new(EVENT_CREATED, record.id), &record);
        Ok(record)
    }

    /// Fetch a record owned by `owner_id`.
    ///
    /// Records belonging to someone else are reported as not found.
    pub async fn get_record(
        &self,
        owner_id: &str,
        id: DbId,
    ) -> Result<AudioGeneration, GenerationError> {
        match self.store.find_by_id(id).await? {
            Some(record) if record.owner_id == owner_id => Ok(record),
            _ => Err(CoreError::NotFound { entity: ENTITY, id }.into()),
        }
    }

    pub async fn list_for_owner(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AudioGeneration>, GenerationError> {
        Ok(self.store.list_by_owner(owner_id, limit, offset).await?)
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Replace every wizard answer on a `draft` record.
    pub async fn replace_answers(
        &self,
        owner_id: &str,
        id: DbId,
        answers: &WizardAnswers,
    ) -> Result<AudioGeneration, GenerationError> {
        wizard::validate_answers(answers)?;
        let patch = AudioGenerationPatch::to_status(GenerationStatus::Draft)
            .with_answers(wizard::normalize_answers(answers));

        let record = self
            .apply_edit(owner_id, id, GenerationAction::ReplaceAnswers, &patch)
            .await?;

        tracing::info!(generation_id = id, "Generation answers replaced");
        self.publish(LifecycleEvent::new(EVENT_ANSWERS_REPLACED, id), &record);
        Ok(record)
    }

    /// Overwrite the generated script of a `script_ready` record.
    pub async fn edit_script(
        &self,
        owner_id: &str,
        id: DbId,
        text: &str,
    ) -> Result<AudioGeneration, GenerationError> {
        wizard::validate_script_text(text)?;
        let patch = AudioGenerationPatch::to_status(GenerationStatus::ScriptReady)
            .with_script_text(text.trim());

        let record = self
            .apply_edit(owner_id, id, GenerationAction::EditScript, &patch)
            .await?;

        tracing::info!(generation_id = id, "Generation script edited");
        self.publish(LifecycleEvent::new(EVENT_SCRIPT_EDITED, id), &record);
        Ok(record)
    }

    /// Shared path for in-place edits that keep the current status.
    async fn apply_edit(
        &self,
        owner_id: &str,
        id: DbId,
        action: GenerationAction,
        patch: &AudioGenerationPatch,
    ) -> Result<AudioGeneration, GenerationError> {
        let record = self.get_record(owner_id, id).await?;
        check_edit(action, record.status()?)?;

        match self.store.update_if_status(id, patch.status, patch).await {
            Ok(updated) => Ok(updated),
            Err(StoreError::PreconditionFailed { .. }) => {
                // Re-read to report what the record moved to.
                let current = self.get_record(owner_id, id).await?;
                check_edit(action, current.status()?)?;
                Err(GenerationError::PreconditionFailed {
                    id,
                    expected: patch.status,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    // -----------------------------------------------------------------------
    // Stage triggers
    // -----------------------------------------------------------------------

    /// `draft` → `script_generating` → `script_ready` | `failed`.
    pub async fn request_script(
        &self,
        owner_id: &str,
        id: DbId,
    ) -> Result<AudioGeneration, GenerationError> {
        self.run_stage(owner_id, id, GenerationAction::RequestScript)
            .await
    }

    /// Retry a failed script stage.
    pub async fn retry_script(
        &self,
        owner_id: &str,
        id: DbId,
    ) -> Result<AudioGeneration, GenerationError> {
        self.run_stage(owner_id, id, GenerationAction::RetryScript)
            .await
    }

    /// `script_ready` → `preview_generating` → `preview_ready` | `failed`.
    pub async fn request_preview(
        &self,
        owner_id: &str,
        id: DbId,
    ) -> Result<AudioGeneration, GenerationError> {
        self.run_stage(owner_id, id, GenerationAction::RequestPreview)
            .await
    }

    /// Retry a failed preview stage.
    pub async fn retry_preview(
        &self,
        owner_id: &str,
        id: DbId,
    ) -> Result<AudioGeneration, GenerationError> {
        self.run_stage(owner_id, id, GenerationAction::RetryPreview)
            .await
    }

    /// `preview_ready` → `hq_generating` → `hq_ready` | `failed`.
    pub async fn request_hq(
        &self,
        owner_id: &str,
        id: DbId,
    ) -> Result<AudioGeneration, GenerationError> {
        self.run_stage(owner_id, id, GenerationAction::RequestHq).await
    }

    /// Retry a failed HQ stage.
    pub async fn retry_hq(
        &self,
        owner_id: &str,
        id: DbId,
    ) -> Result<AudioGeneration, GenerationError> {
        self.run_stage(owner_id, id, GenerationAction::RetryHq).await
    }

    async fn run_stage(
        &self,
        owner_id: &str,
        id: DbId,
        action: GenerationAction,
    ) -> Result<AudioGeneration, GenerationError> {
        let record = self.get_record(owner_id, id).await?;
        let claim = plan_transition(action, record.status()?, record.failed_stage()?)?;

        // Surface unusable answers before anything is written.
        if claim.stage == Stage::Script {
            build_script_prompt(&record.answers.0)?;
        }

        let claimed = match self
            .store
            .update_if_status(
                id,
                claim.expected,
                &AudioGenerationPatch::to_status(claim.generating),
            )
            .await
        {
            Ok(row) => row,
            Err(StoreError::PreconditionFailed { .. }) => {
                tracing::info!(
                    generation_id = id,
                    stage = claim.stage.as_str(),
                    "Lost claim race, another trigger is in flight",
                );
                return Err(TransitionError::AlreadyInProgress { stage: claim.stage }.into());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            generation_id = id,
            owner_id,
            stage = claim.stage.as_str(),
            from = claim.expected.as_str(),
            "Generation stage started",
        );
        self.publish(LifecycleEvent::entered(claim.generating, id), &claimed);

        // Once claimed, the outcome is written even if this future is dropped.
        let workflow = self.clone();
        let (stage, generating) = (claim.stage, claim.generating);
        tokio::spawn(async move { workflow.finish_stage(stage, generating, claimed).await })
            .await
            .map_err(|e| {
                tracing::error!(
                    generation_id = id,
                    stage = stage.as_str(),
                    error = %e,
                    "Stage task aborted",
                );
                CoreError::Internal(format!("generation {id} stage task aborted: {e}"))
            })?
    }

    /// Run the claimed stage and persist its outcome.
    async fn finish_stage(
        &self,
        stage: Stage,
        generating: GenerationStatus,
        claimed: AudioGeneration,
    ) -> Result<AudioGeneration, GenerationError> {
        let id = claimed.id;
        match self.attempt(stage, &claimed).await {
            Ok(patch) => self.complete(id, stage, generating, &patch).await,
            Err(failure) => {
                self.fail(id, stage, generating, &failure).await?;
                Err(failure.into())
            }
        }
    }

    /// Perform the stage's single outbound call against the claimed record.
    async fn attempt(
        &self,
        stage: Stage,
        record: &AudioGeneration,
    ) -> Result<AudioGenerationPatch, AttemptError> {
        let ready = AudioGenerationPatch::to_status(stage.ready_status());

        let Some(profile) = self.profiles.for_stage(stage) else {
            let prompt = build_script_prompt(&record.answers.0).map_err(AttemptError::Input)?;
            let script = self
                .scripts
                .generate_script(&prompt)
                .await
                .map_err(AttemptError::Upstream)?;
            let script = script.trim();
            if script.is_empty() {
                return Err(AttemptError::Upstream(UpstreamError::InvalidResponse {
                    service: SCRIPT_SERVICE,
                    message: "script was empty".to_string(),
                }));
            }
            return Ok(ready.with_script_text(script));
        };

        // Always the script on the freshly claimed row, never an earlier read.
        let script = record
            .script_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AttemptError::Input(CoreError::Internal(format!(
                    "generation {} has no script to synthesize",
                    record.id
                )))
            })?;

        let audio = self
            .voices
            .synthesize(script, profile)
            .await
            .map_err(AttemptError::Upstream)?;
        let reference = self
            .assets
            .store(&audio)
            .await
            .map_err(AttemptError::Asset)?;

        Ok(match stage {
            Stage::Hq => ready.with_hq_audio_ref(reference),
            _ => ready.with_preview_audio_ref(reference),
        })
    }

    async fn complete(
        &self,
        id: DbId,
        stage: Stage,
        generating: GenerationStatus,
        patch: &AudioGenerationPatch,
    ) -> Result<AudioGeneration, GenerationError> {
        let record = match self.store.update_if_status(id, generating, patch).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(
                    generation_id = id,
                    stage = stage.as_str(),
                    error = %e,
                    "Failed to record stage result",
                );
                self.discard_audio(id, patch).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            generation_id = id,
            stage = stage.as_str(),
            status = record.status.as_str(),
            "Generation stage completed",
        );
        self.publish(LifecycleEvent::entered(patch.status, id), &record);
        Ok(record)
    }

    /// Delete audio stored by an attempt whose result was never recorded.
    async fn discard_audio(&self, id: DbId, patch: &AudioGenerationPatch) {
        let stored = [&patch.preview_audio_ref, &patch.hq_audio_ref];
        for reference in stored.into_iter().flatten() {
            if let Err(e) = self.assets.remove(reference).await {
                tracing::warn!(
                    generation_id = id,
                    reference = %reference,
                    error = %e,
                    "Failed to remove unrecorded audio asset",
                );
            }
        }
    }

    async fn fail(
        &self,
        id: DbId,
        stage: Stage,
        generating: GenerationStatus,
        failure: &AttemptError,
    ) -> Result<AudioGeneration, GenerationError> {
        let reason = failure.reason(stage);
        tracing::warn!(
            generation_id = id,
            stage = stage.as_str(),
            reason = %reason,
            "Generation stage failed",
        );

        let record = self
            .store
            .update_if_status(id, generating, &AudioGenerationPatch::failed(stage, &reason))
            .await
            .inspect_err(|e| {
                tracing::error!(
                    generation_id = id,
                    stage = stage.as_str(),
                    error = %e,
                    "Failed to record stage failure",
                );
            })?;

        self.publish(
            LifecycleEvent::entered(GenerationStatus::Failed, id),
            &record,
        );
        Ok(record)
    }

    fn publish(&self, event: LifecycleEvent, record: &AudioGeneration) {
        let payload = serde_json::json!({
            "status": record.status,
            "failed_stage": record.failed_stage,
            "failure_reason": record.failure_reason,
        });
        self.events
            .publish(event.with_owner(&record.owner_id).with_payload(payload));
    }
}
