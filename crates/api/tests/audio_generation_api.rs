//! HTTP-level integration tests for the pitch wizard and generation
//! endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener.

mod common;

use axum::http::StatusCode;
use common::{
    body_bytes, body_json, create_draft, full_answers, get, get_as, post_as, post_json, put_json,
    StubScripts, StubVoices, DEFAULT_SCRIPT, OTHER_OWNER, OWNER,
};
use pitch_core::upstream::UpstreamError;
use serde_json::json;

const BASE: &str = "/api/v1/audio-generations";

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn questions_are_listed_in_prompt_order() {
    let app = common::build_test_app();
    let response = get(app, &format!("{BASE}/questions")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let questions = json["data"].as_array().unwrap();
    assert_eq!(questions.len(), 8);
    assert_eq!(questions[0]["key"], "business_name");
    assert_eq!(questions[7]["key"], "call_to_action");
    assert!(questions[0]["label"].is_string());
}

#[tokio::test]
async fn requests_without_owner_are_unauthorized() {
    let app = common::build_test_app();
    let response = get(app, BASE).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn incomplete_answers_are_rejected_and_nothing_is_saved() {
    let app = common::build_test_app();
    let mut answers = full_answers();
    answers["offer"] = json!("   ");
    answers.as_object_mut().unwrap().remove("tone");

    let response = post_json(app.clone(), OWNER, BASE, json!({ "answers": answers })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INCOMPLETE_ANSWERS");
    assert_eq!(json["missing"], json!(["offer", "tone"]));

    let listed = body_json(get_as(app, OWNER, BASE).await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Full flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn draft_to_hq_audio_end_to_end() {
    let app = common::build_test_app();

    let response = post_json(app.clone(), OWNER, BASE, json!({ "answers": full_answers() })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["status"], "draft");
    assert_eq!(created["data"]["owner_id"], OWNER);
    assert!(created["data"]["script_text"].is_null());
    let id = created["data"]["id"].as_i64().unwrap();

    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/script")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "script_ready");
    assert_eq!(json["data"]["script_text"], DEFAULT_SCRIPT);

    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/preview")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "preview_ready");
    let preview_url = json["data"]["preview_audio_url"].as_str().unwrap().to_string();
    assert!(preview_url.starts_with("/api/v1/audio-assets/"));
    assert!(json["data"]["hq_audio_url"].is_null());

    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/hq")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "hq_ready");
    assert_eq!(json["data"]["preview_audio_url"], preview_url.as_str());
    let hq_url = json["data"]["hq_audio_url"].as_str().unwrap().to_string();

    let response = get(app.clone(), &preview_url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/mpeg");
    assert_eq!(
        body_bytes(response).await,
        format!("preview-model:{DEFAULT_SCRIPT}").into_bytes()
    );

    let response = get(app.clone(), &hq_url).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response).await,
        format!("hq-model:{DEFAULT_SCRIPT}").into_bytes()
    );

    let fetched = body_json(get_as(app, OWNER, &format!("{BASE}/{id}")).await).await;
    assert_eq!(fetched["data"]["status"], "hq_ready");
    assert!(fetched["data"]["failure_reason"].is_null());
}

#[tokio::test]
async fn out_of_order_stage_is_a_conflict() {
    let app = common::build_test_app();
    let id = create_draft(&app, OWNER).await;

    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/hq")).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_STATE_TRANSITION");

    let fetched = body_json(get_as(app, OWNER, &format!("{BASE}/{id}")).await).await;
    assert_eq!(fetched["data"]["status"], "draft");
}

// ---------------------------------------------------------------------------
// Failures and retries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn script_timeout_is_recorded_then_retried() {
    let scripts = StubScripts::with(vec![Err(UpstreamError::Timeout {
        service: "script writer",
        timeout_secs: 60,
    })]);
    let app = common::build_test_app_with(scripts, StubVoices::default());
    let id = create_draft(&app, OWNER).await;

    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/script")).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["code"], "UPSTREAM_TIMEOUT");

    let fetched = body_json(get_as(app.clone(), OWNER, &format!("{BASE}/{id}")).await).await;
    assert_eq!(fetched["data"]["status"], "failed");
    assert_eq!(fetched["data"]["failed_stage"], "script");
    assert!(fetched["data"]["failure_reason"]
        .as_str()
        .unwrap()
        .starts_with("UpstreamTimeout"));

    // A plain request is not a retry.
    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/script")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/script/retry")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "script_ready");
    assert!(json["data"]["failure_reason"].is_null());
    assert!(json["data"]["failed_stage"].is_null());
}

#[tokio::test]
async fn rejected_preview_keeps_the_script() {
    let voices = StubVoices::with(vec![Err(UpstreamError::Rejected {
        service: "voice synthesis",
        status: Some(401),
        message: "HTTP 401: invalid api key".into(),
    })]);
    let app = common::build_test_app_with(StubScripts::default(), voices);
    let id = create_draft(&app, OWNER).await;
    post_as(app.clone(), OWNER, &format!("{BASE}/{id}/script")).await;

    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/preview")).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "UPSTREAM_REJECTED");

    let fetched = body_json(get_as(app.clone(), OWNER, &format!("{BASE}/{id}")).await).await;
    assert_eq!(fetched["data"]["status"], "failed");
    assert_eq!(fetched["data"]["failed_stage"], "preview");
    assert_eq!(fetched["data"]["script_text"], DEFAULT_SCRIPT);

    // Only the failed stage can be retried.
    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/hq/retry")).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_as(app, OWNER, &format!("{BASE}/{id}/preview/retry")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "preview_ready");
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[tokio::test]
async fn other_owners_see_not_found() {
    let app = common::build_test_app();
    let id = create_draft(&app, OWNER).await;

    let response = get_as(app.clone(), OTHER_OWNER, &format!("{BASE}/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let response = post_as(app.clone(), OTHER_OWNER, &format!("{BASE}/{id}/script")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let fetched = body_json(get_as(app, OWNER, &format!("{BASE}/{id}")).await).await;
    assert_eq!(fetched["data"]["status"], "draft");
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn answers_are_replaced_while_draft() {
    let app = common::build_test_app();
    let id = create_draft(&app, OWNER).await;

    let mut answers = full_answers();
    answers["business_name"] = json!("  Rosa's Bakery  ");
    let response = put_json(
        app.clone(),
        OWNER,
        &format!("{BASE}/{id}/answers"),
        json!({ "answers": answers }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["answers"]["business_name"], "Rosa's Bakery");

    post_as(app.clone(), OWNER, &format!("{BASE}/{id}/script")).await;
    let response = put_json(
        app,
        OWNER,
        &format!("{BASE}/{id}/answers"),
        json!({ "answers": full_answers() }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn script_edits_are_validated_and_trimmed() {
    let app = common::build_test_app();
    let id = create_draft(&app, OWNER).await;
    let uri = format!("{BASE}/{id}/script");

    // No script yet.
    let response = put_json(app.clone(), OWNER, &uri, json!({ "script_text": "Hello" })).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    post_as(app.clone(), OWNER, &uri).await;

    let response = put_json(app.clone(), OWNER, &uri, json!({ "script_text": "" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");

    let response = put_json(
        app.clone(),
        OWNER,
        &uri,
        json!({ "script_text": "  Come taste the difference.  " }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "script_ready");
    assert_eq!(json["data"]["script_text"], "Come taste the difference.");

    // The preview renders the edited text.
    let response = post_as(app.clone(), OWNER, &format!("{BASE}/{id}/preview")).await;
    let preview_url = body_json(response).await["data"]["preview_audio_url"]
        .as_str()
        .unwrap()
        .to_string();
    let bytes = body_bytes(get(app, &preview_url).await).await;
    assert_eq!(bytes, b"preview-model:Come taste the difference.".to_vec());
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn listing_is_scoped_and_newest_first() {
    let app = common::build_test_app();
    let first = create_draft(&app, OWNER).await;
    create_draft(&app, OTHER_OWNER).await;
    let second = create_draft(&app, OWNER).await;

    let json = body_json(get_as(app.clone(), OWNER, BASE).await).await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![second, first]);

    let json = body_json(get_as(app.clone(), OWNER, &format!("{BASE}?limit=1")).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = get_as(app, OWNER, &format!("{BASE}?limit=0")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Audio assets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_asset_reference_is_rejected() {
    let app = common::build_test_app();
    let response = get(app, "/api/v1/audio-assets/not-a-reference.mp3").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_asset_is_not_found() {
    let app = common::build_test_app();
    let response = get(
        app,
        "/api/v1/audio-assets/3f2b8c1e-9d4a-4e7b-8a6f-1c2d3e4f5a6b.mp3",
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}
