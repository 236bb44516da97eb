//! Integration tests for the `audio_generations` repository.
//!
//! Exercises the conditional-update contract against a real database. Run
//! with `DATABASE_URL` pointing at a disposable PostgreSQL instance and
//! `cargo test -- --ignored`.

use pitch_core::audio_generation::{GenerationStatus, Stage};
use pitch_core::wizard::{WizardAnswers, QUESTION_KEYS};
use pitch_db::models::audio_generation::{AudioGenerationPatch, CreateAudioGeneration};
use pitch_db::repositories::{AudioGenerationRepo, GenerationEventRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_draft(owner: &str) -> CreateAudioGeneration {
    CreateAudioGeneration {
        owner_id: owner.to_string(),
        answers: QUESTION_KEYS
            .iter()
            .map(|k| (*k, format!("{k} answer")))
            .collect::<WizardAnswers>(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn create_starts_in_draft(pool: PgPool) {
    let record = AudioGenerationRepo::create(&pool, &new_draft("user_1"))
        .await
        .unwrap();

    assert_eq!(record.status, "draft");
    assert_eq!(record.owner_id, "user_1");
    assert_eq!(record.answers.0.len(), 8);
    assert!(record.script_text.is_none());
    assert!(record.failure_reason.is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn update_if_status_is_compare_and_set(pool: PgPool) {
    let record = AudioGenerationRepo::create(&pool, &new_draft("user_2"))
        .await
        .unwrap();
    let claim = AudioGenerationPatch::to_status(GenerationStatus::ScriptGenerating);

    let first = AudioGenerationRepo::update_if_status(
        &pool,
        record.id,
        GenerationStatus::Draft,
        &claim,
    )
    .await
    .unwrap();
    let second = AudioGenerationRepo::update_if_status(
        &pool,
        record.id,
        GenerationStatus::Draft,
        &claim,
    )
    .await
    .unwrap();

    assert_eq!(first.unwrap().status, "script_generating");
    assert!(second.is_none(), "second claim must lose the race");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn failure_is_cleared_by_the_next_transition(pool: PgPool) {
    let record = AudioGenerationRepo::create(&pool, &new_draft("user_3"))
        .await
        .unwrap();
    let id = record.id;

    let claim = AudioGenerationPatch::to_status(GenerationStatus::ScriptGenerating);
    AudioGenerationRepo::update_if_status(&pool, id, GenerationStatus::Draft, &claim)
        .await
        .unwrap()
        .unwrap();

    let failed = AudioGenerationRepo::update_if_status(
        &pool,
        id,
        GenerationStatus::ScriptGenerating,
        &AudioGenerationPatch::failed(Stage::Script, "UpstreamTimeout: slow"),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(failed.failed_stage.as_deref(), Some("script"));
    assert!(failed.script_text.is_none());

    let retried = AudioGenerationRepo::update_if_status(&pool, id, GenerationStatus::Failed, &claim)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(retried.status, "script_generating");
    assert!(retried.failure_reason.is_none());
    assert!(retried.failed_stage.is_none());
    assert!(retried.updated_at >= failed.updated_at);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn check_constraint_rejects_hq_ref_outside_hq_ready(pool: PgPool) {
    let record = AudioGenerationRepo::create(&pool, &new_draft("user_4"))
        .await
        .unwrap();

    let bad = AudioGenerationPatch::to_status(GenerationStatus::Draft).with_hq_audio_ref("x.mp3");
    let result =
        AudioGenerationRepo::update_if_status(&pool, record.id, GenerationStatus::Draft, &bad)
            .await;

    assert!(result.is_err(), "ck_audio_generations_hq_ref must reject the row");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn list_by_owner_is_scoped_and_newest_first(pool: PgPool) {
    let older = AudioGenerationRepo::create(&pool, &new_draft("owner_a"))
        .await
        .unwrap();
    let newer = AudioGenerationRepo::create(&pool, &new_draft("owner_a"))
        .await
        .unwrap();
    AudioGenerationRepo::create(&pool, &new_draft("owner_b"))
        .await
        .unwrap();

    let rows = AudioGenerationRepo::list_by_owner(&pool, "owner_a", 10, 0)
        .await
        .unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn events_are_listed_in_insert_order(pool: PgPool) {
    let record = AudioGenerationRepo::create(&pool, &new_draft("user_5"))
        .await
        .unwrap();
    let payload = serde_json::json!({ "status": "draft" });

    GenerationEventRepo::insert(&pool, record.id, "audio_generation.created", Some("user_5"), &payload)
        .await
        .unwrap();
    GenerationEventRepo::insert(&pool, record.id, "audio_generation.script_generating", None, &payload)
        .await
        .unwrap();

    let events = GenerationEventRepo::list_for_generation(&pool, record.id)
        .await
        .unwrap();
    let types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(
        types,
        vec!["audio_generation.created", "audio_generation.script_generating"]
    );
}
