//! Handlers for the pitch wizard and generation records.
//!
//! Every handler is scoped to the calling [`OwnerId`]; records owned by
//! another account are reported as not found. Stage triggers block until
//! the upstream call finishes and return the updated record. When the call
//! fails the record is marked failed and the upstream error is returned.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use pitch_core::error::CoreError;
use pitch_core::types::DbId;
use pitch_core::wizard::{WizardAnswers, WizardQuestion, QUESTIONS};
use pitch_db::models::audio_generation::{AudioGeneration, AudioGenerationListParams};
use pitch_db::repositories::audio_generation_repo::DEFAULT_LIMIT;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::owner::OwnerId;
use crate::response::DataResponse;
use crate::state::AppState;

/// Public path prefix of the audio asset route.
const AUDIO_ASSET_PATH: &str = "/api/v1/audio-assets";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for creating a draft or replacing its answers.
#[derive(Debug, Deserialize)]
pub struct AnswersRequest {
    /// Question key to free-text answer. All eight keys are required.
    pub answers: WizardAnswers,
}

/// Request body for editing a generated script. Longer limits are
/// enforced by the workflow.
#[derive(Debug, Deserialize, Validate)]
pub struct EditScriptRequest {
    #[validate(length(min = 1, message = "script_text must not be empty"))]
    pub script_text: String,
}

/// Query parameters for listing records.
#[derive(Debug, Deserialize, Validate)]
pub struct ListQuery {
    /// Page size (default: 20, max: 100).
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    /// Records to skip (default: 0).
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

impl From<ListQuery> for AudioGenerationListParams {
    fn from(query: ListQuery) -> Self {
        Self {
            limit: query.limit,
            offset: query.offset,
        }
    }
}

/// A generation record plus playable URLs for its audio.
#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    #[serde(flatten)]
    pub record: AudioGeneration,
    pub preview_audio_url: Option<String>,
    pub hq_audio_url: Option<String>,
}

impl From<AudioGeneration> for GenerationResponse {
    fn from(record: AudioGeneration) -> Self {
        let url = |reference: &Option<String>| {
            reference
                .as_deref()
                .map(|r| format!("{AUDIO_ASSET_PATH}/{r}"))
        };
        Self {
            preview_audio_url: url(&record.preview_audio_ref),
            hq_audio_url: url(&record.hq_audio_ref),
            record,
        }
    }
}

type GenerationJson = Json<DataResponse<GenerationResponse>>;

fn respond(record: AudioGeneration) -> GenerationJson {
    Json(DataResponse {
        data: record.into(),
    })
}

fn validate<T: Validate>(input: &T) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

/// GET /audio-generations/questions
///
/// The fixed wizard questions, in the order they feed the prompt.
pub async fn list_questions() -> Json<DataResponse<&'static [WizardQuestion]>> {
    let questions: &'static [WizardQuestion] = &QUESTIONS;
    Json(DataResponse { data: questions })
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// POST /audio-generations
pub async fn create_draft(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Json(input): Json<AnswersRequest>,
) -> AppResult<(StatusCode, GenerationJson)> {
    let record = state.workflow.create_draft(&owner, &input.answers).await?;
    Ok((StatusCode::CREATED, respond(record)))
}

/// GET /audio-generations
///
/// The caller's records, newest first.
pub async fn list_generations(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<DataResponse<Vec<GenerationResponse>>>> {
    validate(&query)?;
    let params = AudioGenerationListParams::from(query);

    let records = state
        .workflow
        .list_for_owner(
            &owner,
            params.limit.unwrap_or(DEFAULT_LIMIT),
            params.offset.unwrap_or(0),
        )
        .await?;

    Ok(Json(DataResponse {
        data: records.into_iter().map(GenerationResponse::from).collect(),
    }))
}

/// GET /audio-generations/{id}
pub async fn get_generation(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<DbId>,
) -> AppResult<GenerationJson> {
    let record = state.workflow.get_record(&owner, id).await?;
    Ok(respond(record))
}

/// PUT /audio-generations/{id}/answers
///
/// Replace every answer. Allowed only while the record is a draft.
pub async fn replace_answers(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<DbId>,
    Json(input): Json<AnswersRequest>,
) -> AppResult<GenerationJson> {
    let record = state
        .workflow
        .replace_answers(&owner, id, &input.answers)
        .await?;
    Ok(respond(record))
}

/// PUT /audio-generations/{id}/script
///
/// Overwrite the generated script. Allowed only in `script_ready`.
pub async fn edit_script(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<DbId>,
    Json(input): Json<EditScriptRequest>,
) -> AppResult<GenerationJson> {
    validate(&input)?;
    let record = state
        .workflow
        .edit_script(&owner, id, &input.script_text)
        .await?;
    Ok(respond(record))
}

// ---------------------------------------------------------------------------
// Stage triggers
// ---------------------------------------------------------------------------

/// POST /audio-generations/{id}/script
pub async fn request_script(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<DbId>,
) -> AppResult<GenerationJson> {
    Ok(respond(state.workflow.request_script(&owner, id).await?))
}

/// POST /audio-generations/{id}/script/retry
pub async fn retry_script(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<DbId>,
) -> AppResult<GenerationJson> {
    Ok(respond(state.workflow.retry_script(&owner, id).await?))
}

/// POST /audio-generations/{id}/preview
pub async fn request_preview(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<DbId>,
) -> AppResult<GenerationJson> {
    Ok(respond(state.workflow.request_preview(&owner, id).await?))
}

/// POST /audio-generations/{id}/preview/retry
pub async fn retry_preview(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<DbId>,
) -> AppResult<GenerationJson> {
    Ok(respond(state.workflow.retry_preview(&owner, id).await?))
}

/// POST /audio-generations/{id}/hq
pub async fn request_hq(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<DbId>,
) -> AppResult<GenerationJson> {
    Ok(respond(state.workflow.request_hq(&owner, id).await?))
}

/// POST /audio-generations/{id}/hq/retry
pub async fn retry_hq(
    State(state): State<AppState>,
    OwnerId(owner): OwnerId,
    Path(id): Path<DbId>,
) -> AppResult<GenerationJson> {
    Ok(respond(state.workflow.retry_hq(&owner, id).await?))
}
