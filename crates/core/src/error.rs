use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// One or more wizard answers are absent or blank. Keys are listed in
    /// wizard order.
    #[error("Incomplete answers, missing: {}", .missing.join(", "))]
    IncompleteAnswers { missing: Vec<&'static str> },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
