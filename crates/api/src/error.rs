use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pitch_core::assets::AssetError;
use pitch_core::audio_generation::TransitionError;
use pitch_core::error::CoreError;
use pitch_core::upstream::UpstreamError;
use pitch_pipeline::GenerationError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`GenerationError`] for
/// workflow failures, plus asset read errors. Implements
/// [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `pitch_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A workflow operation failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Reading a stored audio asset failed.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Status, machine-readable code and message for one error.
type ErrorParts = (StatusCode, &'static str, String);

const INTERNAL_MESSAGE: &str = "An internal error occurred";

fn internal() -> ErrorParts {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Generation(err) => classify_generation_error(err),
            AppError::Asset(err) => classify_asset_error(err),
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(missing) = self.missing_answers() {
            body["missing"] = json!(missing);
        }

        (status, axum::Json(body)).into_response()
    }
}

impl AppError {
    /// Question keys named by an `IncompleteAnswers` error, if this is one.
    fn missing_answers(&self) -> Option<&[&'static str]> {
        let core = match self {
            AppError::Core(core) | AppError::Generation(GenerationError::Core(core)) => core,
            _ => return None,
        };
        match core {
            CoreError::IncompleteAnswers { missing } => Some(missing.as_slice()),
            _ => None,
        }
    }
}

fn classify_core_error(err: &CoreError) -> ErrorParts {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::IncompleteAnswers { .. } => (
            StatusCode::BAD_REQUEST,
            "INCOMPLETE_ANSWERS",
            err.to_string(),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

fn classify_generation_error(err: &GenerationError) -> ErrorParts {
    match err {
        GenerationError::Core(core) => classify_core_error(core),
        GenerationError::Transition(t) => match t {
            TransitionError::InvalidStateTransition { .. } => (
                StatusCode::CONFLICT,
                "INVALID_STATE_TRANSITION",
                t.to_string(),
            ),
            TransitionError::AlreadyInProgress { .. } => {
                (StatusCode::CONFLICT, "ALREADY_IN_PROGRESS", t.to_string())
            }
        },
        GenerationError::PreconditionFailed { .. } => (
            StatusCode::CONFLICT,
            "PRECONDITION_FAILED",
            err.to_string(),
        ),
        GenerationError::Upstream(upstream) => classify_upstream_error(upstream),
        GenerationError::Asset(asset) => {
            tracing::error!(error = %asset, "Rendered audio could not be stored");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ASSET_STORAGE_FAILED",
                "Rendered audio could not be stored".to_string(),
            )
        }
        GenerationError::Database(db) => {
            tracing::error!(error = %db, "Database error");
            internal()
        }
        GenerationError::Constraint(msg) => {
            tracing::error!(error = %msg, "Record constraint violated");
            internal()
        }
    }
}

/// The record has already been marked failed; tell the caller which way
/// the upstream call went.
fn classify_upstream_error(err: &UpstreamError) -> ErrorParts {
    let status = match err {
        UpstreamError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        UpstreamError::Rejected { .. } | UpstreamError::InvalidResponse { .. } => {
            StatusCode::BAD_GATEWAY
        }
    };
    let code = match err {
        UpstreamError::Timeout { .. } => "UPSTREAM_TIMEOUT",
        UpstreamError::Rejected { .. } => "UPSTREAM_REJECTED",
        UpstreamError::InvalidResponse { .. } => "UPSTREAM_INVALID_RESPONSE",
    };
    (status, code, err.to_string())
}

fn classify_asset_error(err: &AssetError) -> ErrorParts {
    match err {
        AssetError::NotFound(reference) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Audio asset {reference} not found"),
        ),
        AssetError::InvalidReference(reference) => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            format!("Invalid audio asset reference: {reference}"),
        ),
        AssetError::Io(e) => {
            tracing::error!(error = %e, "Audio asset read failed");
            internal()
        }
    }
}
