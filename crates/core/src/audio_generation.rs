//! Audio generation status machine.
//!
//! A generation record moves through three stages (script, preview audio,
//! HQ audio). Each stage has a `_generating` status that doubles as the
//! record's in-flight flag, a `_ready` status, and a shared `failed` status
//! tagged with the [`Stage`] whose attempt failed.
//!
//! ```text
//! draft ──► script_generating ──► script_ready ──► preview_generating ──► preview_ready ──► hq_generating ──► hq_ready
//!                 │                    ▲                   │                     ▲                 │
//!                 ▼                    │                   ▼                     │                 ▼
//!          failed(script) ── retry ────┘            failed(preview) ── retry ────┘          failed(hq) ── retry ──► hq_generating
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::upstream::UpstreamError;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Persisted status of a generation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Draft,
    ScriptGenerating,
    ScriptReady,
    PreviewGenerating,
    PreviewReady,
    HqGenerating,
    HqReady,
    Failed,
}

impl GenerationStatus {
    pub const ALL: [GenerationStatus; 8] = [
        Self::Draft,
        Self::ScriptGenerating,
        Self::ScriptReady,
        Self::PreviewGenerating,
        Self::PreviewReady,
        Self::HqGenerating,
        Self::HqReady,
        Self::Failed,
    ];

    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid generation status '{s}'")))
    }

    /// Convert to a database-compatible string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::ScriptGenerating => "script_generating",
            Self::ScriptReady => "script_ready",
            Self::PreviewGenerating => "preview_generating",
            Self::PreviewReady => "preview_ready",
            Self::HqGenerating => "hq_generating",
            Self::HqReady => "hq_ready",
            Self::Failed => "failed",
        }
    }

    /// The stage currently in flight, if any.
    pub fn generating_stage(self) -> Option<Stage> {
        match self {
            Self::ScriptGenerating => Some(Stage::Script),
            Self::PreviewGenerating => Some(Stage::Preview),
            Self::HqGenerating => Some(Stage::Hq),
            _ => None,
        }
    }

    /// Whether the record must carry a non-empty script in this status.
    pub fn requires_script(self) -> bool {
        matches!(
            self,
            Self::ScriptReady
                | Self::PreviewGenerating
                | Self::PreviewReady
                | Self::HqGenerating
                | Self::HqReady
        )
    }

    /// Whether the record must carry a preview audio reference in this status.
    pub fn requires_preview_audio(self) -> bool {
        matches!(self, Self::PreviewReady | Self::HqGenerating | Self::HqReady)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One of the three generation phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Script,
    Preview,
    Hq,
}

impl Stage {
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "script" => Ok(Self::Script),
            "preview" => Ok(Self::Preview),
            "hq" => Ok(Self::Hq),
            _ => Err(CoreError::Validation(format!(
                "Invalid generation stage '{s}'. Must be one of: script, preview, hq"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Preview => "preview",
            Self::Hq => "hq",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Preview => "preview audio",
            Self::Hq => "HQ audio",
        }
    }

    /// Status a record must be in before a first attempt at this stage.
    pub fn entry_status(self) -> GenerationStatus {
        match self {
            Self::Script => GenerationStatus::Draft,
            Self::Preview => GenerationStatus::ScriptReady,
            Self::Hq => GenerationStatus::PreviewReady,
        }
    }

    pub fn generating_status(self) -> GenerationStatus {
        match self {
            Self::Script => GenerationStatus::ScriptGenerating,
            Self::Preview => GenerationStatus::PreviewGenerating,
            Self::Hq => GenerationStatus::HqGenerating,
        }
    }

    pub fn ready_status(self) -> GenerationStatus {
        match self {
            Self::Script => GenerationStatus::ScriptReady,
            Self::Preview => GenerationStatus::PreviewReady,
            Self::Hq => GenerationStatus::HqReady,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// A user-triggered operation on a generation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationAction {
    ReplaceAnswers,
    RequestScript,
    RetryScript,
    EditScript,
    RequestPreview,
    RetryPreview,
    RequestHq,
    RetryHq,
}

impl GenerationAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReplaceAnswers => "replace answers",
            Self::RequestScript => "request script",
            Self::RetryScript => "retry script",
            Self::EditScript => "edit script",
            Self::RequestPreview => "request preview audio",
            Self::RetryPreview => "retry preview audio",
            Self::RequestHq => "request HQ audio",
            Self::RetryHq => "retry HQ audio",
        }
    }

    /// The stage this action generates, or `None` for in-place edits.
    pub fn stage(self) -> Option<Stage> {
        match self {
            Self::RequestScript | Self::RetryScript => Some(Stage::Script),
            Self::RequestPreview | Self::RetryPreview => Some(Stage::Preview),
            Self::RequestHq | Self::RetryHq => Some(Stage::Hq),
            Self::ReplaceAnswers | Self::EditScript => None,
        }
    }

    pub fn is_retry(self) -> bool {
        matches!(self, Self::RetryScript | Self::RetryPreview | Self::RetryHq)
    }
}

impl fmt::Display for GenerationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Why an action cannot run against a record in its current status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Cannot {action} while generation is '{status}'")]
    InvalidStateTransition {
        action: GenerationAction,
        status: GenerationStatus,
    },

    #[error("Generation of {stage} is already in progress")]
    AlreadyInProgress { stage: Stage },
}

/// The compare-and-set a stage trigger must win before its outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claim {
    pub stage: Stage,
    /// Status the record was observed in.
    pub expected: GenerationStatus,
    /// Status written by the claim.
    pub generating: GenerationStatus,
}

/// Decide whether a stage trigger may start.
///
/// - Already in this stage's `_generating` status: [`TransitionError::AlreadyInProgress`].
/// - Request actions require the stage's entry status.
/// - Retry actions require `failed` with a matching `failed_stage`.
/// - Anything else (including edit actions): [`TransitionError::InvalidStateTransition`].
pub fn plan_transition(
    action: GenerationAction,
    status: GenerationStatus,
    failed_stage: Option<Stage>,
) -> Result<Claim, TransitionError> {
    let invalid = TransitionError::InvalidStateTransition { action, status };
    let Some(stage) = action.stage() else {
        return Err(invalid);
    };

    if status == stage.generating_status() {
        return Err(TransitionError::AlreadyInProgress { stage });
    }

    let allowed = if action.is_retry() {
        status == GenerationStatus::Failed && failed_stage == Some(stage)
    } else {
        status == stage.entry_status()
    };

    if !allowed {
        return Err(invalid);
    }

    Ok(Claim {
        stage,
        expected: status,
        generating: stage.generating_status(),
    })
}

/// Decide whether an in-place edit may run.
///
/// Answers may be replaced only while `draft`; the script may be edited
/// only while `script_ready`, before any audio exists for it.
pub fn check_edit(action: GenerationAction, status: GenerationStatus) -> Result<(), TransitionError> {
    let required = match action {
        GenerationAction::ReplaceAnswers => GenerationStatus::Draft,
        GenerationAction::EditScript => GenerationStatus::ScriptReady,
        _ => return Err(TransitionError::InvalidStateTransition { action, status }),
    };
    if status == required {
        Ok(())
    } else if let Some(stage) = status.generating_stage() {
        Err(TransitionError::AlreadyInProgress { stage })
    } else {
        Err(TransitionError::InvalidStateTransition { action, status })
    }
}

// ---------------------------------------------------------------------------
// Failure reasons
// ---------------------------------------------------------------------------

/// Category prefix for failures that happen after a successful upstream
/// call, while storing the rendered audio.
pub const ASSET_STORAGE_CATEGORY: &str = "AssetStorageFailed";

/// Human-readable failure reason persisted on a failed record.
///
/// Always starts with the upstream error category so callers can match on
/// it, e.g. `UpstreamTimeout: script generation failed: ...`.
pub fn upstream_failure_reason(stage: Stage, err: &UpstreamError) -> String {
    format!("{}: {} generation failed: {err}", err.category(), stage.label())
}

// ---------------------------------------------------------------------------
// Record invariants
// ---------------------------------------------------------------------------

/// The fields of a generation record that the status invariants constrain.
#[derive(Debug, Clone, Copy)]
pub struct RecordShape<'a> {
    pub status: GenerationStatus,
    pub failed_stage: Option<Stage>,
    pub script_text: Option<&'a str>,
    pub preview_audio_ref: Option<&'a str>,
    pub hq_audio_ref: Option<&'a str>,
    pub failure_reason: Option<&'a str>,
}

/// Check the cross-field invariants of a generation record.
pub fn validate_record_shape(shape: &RecordShape<'_>) -> Result<(), CoreError> {
    let failed = shape.status == GenerationStatus::Failed;
    let has_reason = shape.failure_reason.is_some_and(|r| !r.trim().is_empty());
    let has_script = shape.script_text.is_some_and(|s| !s.trim().is_empty());

    if failed != has_reason {
        return Err(CoreError::Internal(format!(
            "status '{}' inconsistent with failure reason presence ({has_reason})",
            shape.status
        )));
    }
    if failed != shape.failed_stage.is_some() {
        return Err(CoreError::Internal(format!(
            "status '{}' inconsistent with failed stage presence",
            shape.status
        )));
    }
    if shape.status.requires_script() && !has_script {
        return Err(CoreError::Internal(format!(
            "status '{}' requires a non-empty script",
            shape.status
        )));
    }
    if shape.status.requires_preview_audio() && shape.preview_audio_ref.is_none() {
        return Err(CoreError::Internal(format!(
            "status '{}' requires a preview audio reference",
            shape.status
        )));
    }
    if (shape.status == GenerationStatus::HqReady) != shape.hq_audio_ref.is_some() {
        return Err(CoreError::Internal(format!(
            "HQ audio reference must be set only in 'hq_ready' (status '{}')",
            shape.status
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
