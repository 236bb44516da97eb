//! In-process [`GenerationStore`].
//!
//! Holds every record behind one `tokio::sync::Mutex`, so the
//! compare-and-set in [`update_if_status`](GenerationStore::update_if_status)
//! is atomic for the same reason the PostgreSQL row update is. Candidate
//! rows are checked against the record invariants before being committed,
//! mirroring the table's CHECK constraints.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use pitch_core::audio_generation::{validate_record_shape, GenerationStatus};
use pitch_core::types::DbId;
use pitch_db::models::audio_generation::{
    AudioGeneration, AudioGenerationPatch, CreateAudioGeneration,
};
use pitch_db::repositories::audio_generation_repo::MAX_LIMIT;
use sqlx::types::Json;
use tokio::sync::Mutex;

use crate::store::{GenerationStore, StoreError};

#[derive(Default)]
struct State {
    next_id: DbId,
    rows: BTreeMap<DbId, AudioGeneration>,
}

/// Records kept in process memory. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryGenerationStore {
    state: Mutex<State>,
}

impl InMemoryGenerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.rows.is_empty()
    }
}

/// Apply `patch` to a copy of `row` with the same column semantics as the
/// repository's conditional UPDATE.
fn apply_patch(row: &AudioGeneration, patch: &AudioGenerationPatch) -> AudioGeneration {
    let mut next = row.clone();
    next.status = patch.status.as_str().to_string();
    if let Some(answers) = &patch.answers {
        next.answers = Json(answers.clone());
    }
    if let Some(text) = &patch.script_text {
        next.script_text = Some(text.clone());
    }
    if let Some(reference) = &patch.preview_audio_ref {
        next.preview_audio_ref = Some(reference.clone());
    }
    if let Some(reference) = &patch.hq_audio_ref {
        next.hq_audio_ref = Some(reference.clone());
    }
    next.failed_stage = patch.failure.as_ref().map(|f| f.stage.as_str().to_string());
    next.failure_reason = patch.failure.as_ref().map(|f| f.reason.clone());
    next.updated_at = Utc::now().max(row.updated_at);
    next
}

fn check_constraints(row: &AudioGeneration) -> Result<(), StoreError> {
    row.shape()
        .and_then(|shape| validate_record_shape(&shape))
        .map_err(|e| StoreError::Constraint(e.to_string()))
}

#[async_trait]
impl GenerationStore for InMemoryGenerationStore {
    async fn create(&self, input: &CreateAudioGeneration) -> Result<AudioGeneration, StoreError> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let now = Utc::now();
        let row = AudioGeneration {
            id: state.next_id,
            owner_id: input.owner_id.clone(),
            answers: Json(input.answers.clone()),
            status: GenerationStatus::Draft.as_str().to_string(),
            failed_stage: None,
            script_text: None,
            preview_audio_ref: None,
            hq_audio_ref: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        state.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<AudioGeneration>, StoreError> {
        Ok(self.state.lock().await.rows.get(&id).cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AudioGeneration>, StoreError> {
        let state = self.state.lock().await;
        let mut rows: Vec<AudioGeneration> = state
            .rows
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.clamp(1, MAX_LIMIT)).unwrap_or(1);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_if_status(
        &self,
        id: DbId,
        expected: GenerationStatus,
        patch: &AudioGenerationPatch,
    ) -> Result<AudioGeneration, StoreError> {
        let mut state = self.state.lock().await;
        let row = state.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if row.status != expected.as_str() {
            return Err(StoreError::PreconditionFailed { id, expected });
        }

        let next = apply_patch(row, patch);
        check_constraints(&next)?;
        *row = next.clone();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use pitch_core::audio_generation::Stage;
    use pitch_core::wizard::{WizardAnswers, QUESTION_KEYS};

    use super::*;

    fn draft(owner: &str) -> CreateAudioGeneration {
        CreateAudioGeneration {
            owner_id: owner.to_string(),
            answers: QUESTION_KEYS
                .iter()
                .map(|k| (*k, "x"))
                .collect::<WizardAnswers>(),
        }
    }

    #[tokio::test]
    async fn compare_and_set_rejects_stale_status() {
        let store = InMemoryGenerationStore::new();
        let row = store.create(&draft("u1")).await.unwrap();
        let claim = AudioGenerationPatch::to_status(GenerationStatus::ScriptGenerating);

        store
            .update_if_status(row.id, GenerationStatus::Draft, &claim)
            .await
            .unwrap();

        assert_matches!(
            store
                .update_if_status(row.id, GenerationStatus::Draft, &claim)
                .await,
            Err(StoreError::PreconditionFailed { expected: GenerationStatus::Draft, .. })
        );
    }

    #[tokio::test]
    async fn concurrent_claims_have_one_winner() {
        let store = Arc::new(InMemoryGenerationStore::new());
        let id = store.create(&draft("u1")).await.unwrap().id;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .update_if_status(
                        id,
                        GenerationStatus::Draft,
                        &AudioGenerationPatch::to_status(GenerationStatus::ScriptGenerating),
                    )
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let store = InMemoryGenerationStore::new();
        assert_matches!(
            store
                .update_if_status(
                    99,
                    GenerationStatus::Draft,
                    &AudioGenerationPatch::to_status(GenerationStatus::Draft),
                )
                .await,
            Err(StoreError::NotFound(99))
        );
    }

    #[tokio::test]
    async fn invariant_breaking_patch_is_refused() {
        let store = InMemoryGenerationStore::new();
        let row = store.create(&draft("u1")).await.unwrap();

        // script_ready without a script
        let result = store
            .update_if_status(
                row.id,
                GenerationStatus::Draft,
                &AudioGenerationPatch::to_status(GenerationStatus::ScriptReady),
            )
            .await;
        assert_matches!(result, Err(StoreError::Constraint(_)));

        let unchanged = store.find_by_id(row.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, "draft");
    }

    #[tokio::test]
    async fn failure_is_written_and_later_cleared() {
        let store = InMemoryGenerationStore::new();
        let id = store.create(&draft("u1")).await.unwrap().id;
        let claim = AudioGenerationPatch::to_status(GenerationStatus::ScriptGenerating);

        store
            .update_if_status(id, GenerationStatus::Draft, &claim)
            .await
            .unwrap();
        let failed = store
            .update_if_status(
                id,
                GenerationStatus::ScriptGenerating,
                &AudioGenerationPatch::failed(Stage::Script, "UpstreamTimeout: slow"),
            )
            .await
            .unwrap();
        assert_eq!(failed.failed_stage.as_deref(), Some("script"));

        let retried = store
            .update_if_status(id, GenerationStatus::Failed, &claim)
            .await
            .unwrap();
        assert!(retried.failure_reason.is_none());
        assert!(retried.failed_stage.is_none());
        assert!(retried.updated_at >= failed.updated_at);
    }

    #[tokio::test]
    async fn listing_is_scoped_newest_first_and_paged() {
        let store = InMemoryGenerationStore::new();
        let a = store.create(&draft("owner_a")).await.unwrap().id;
        let b = store.create(&draft("owner_a")).await.unwrap().id;
        store.create(&draft("owner_b")).await.unwrap();

        let all: Vec<DbId> = store
            .list_by_owner("owner_a", 10, 0)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(all, vec![b, a]);

        let second_page = store.list_by_owner("owner_a", 1, 1).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].id, a);
    }
}
