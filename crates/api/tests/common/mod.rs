//! Shared harness for API integration tests.
//!
//! Builds the production router over the in-memory record store, an
//! in-memory asset store, and scripted upstream services, so requests run
//! through the full middleware stack without a database or network.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use pitch_core::assets::AssetStore;
use pitch_core::upstream::{
    ScriptGenerator, SynthesizedAudio, UpstreamError, VoiceProfile, VoiceSynthesizer, VoiceTier,
};
use pitch_core::wizard::QUESTION_KEYS;
use pitch_events::EventBus;
use pitch_pipeline::{GenerationWorkflow, InMemoryGenerationStore, VoiceProfiles};
use pitch_providers::{ElevenLabsConfig, MemoryAssetStore, OpenAiConfig};
use tower::ServiceExt;

use pitch_api::config::ServerConfig;
use pitch_api::router::build_app_router;
use pitch_api::state::AppState;

pub const OWNER: &str = "user_alice";
pub const OTHER_OWNER: &str = "user_bob";

pub const DEFAULT_SCRIPT: &str = "Rosa's Bakery bakes fresh bread every morning. Stop by today.";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout. Provider settings are never used by
/// the stub services.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        database_url: None,
        audio_storage_dir: PathBuf::from("./unused"),
        openai: OpenAiConfig {
            api_key: String::new(),
            base_url: "http://127.0.0.1:9".to_string(),
            model: "test-model".to_string(),
            timeout_secs: 5,
        },
        elevenlabs: ElevenLabsConfig {
            api_key: String::new(),
            base_url: "http://127.0.0.1:9".to_string(),
            voice_id: "voice-test".to_string(),
            preview_model: "preview-model".to_string(),
            hq_model: "hq-model".to_string(),
            timeout_secs: 5,
        },
    }
}

// ---------------------------------------------------------------------------
// Stub upstream services
// ---------------------------------------------------------------------------

/// Script writer returning queued results, then [`DEFAULT_SCRIPT`].
#[derive(Default)]
pub struct StubScripts {
    responses: Mutex<VecDeque<Result<String, UpstreamError>>>,
}

impl StubScripts {
    pub fn with(responses: Vec<Result<String, UpstreamError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ScriptGenerator for StubScripts {
    async fn generate_script(&self, _prompt: &str) -> Result<String, UpstreamError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_SCRIPT.to_string()))
    }
}

/// Voice synthesizer that renders `"<model>:<text>"` as the audio bytes.
#[derive(Default)]
pub struct StubVoices {
    responses: Mutex<VecDeque<Result<SynthesizedAudio, UpstreamError>>>,
}

impl StubVoices {
    pub fn with(responses: Vec<Result<SynthesizedAudio, UpstreamError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl VoiceSynthesizer for StubVoices {
    async fn synthesize(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<SynthesizedAudio, UpstreamError> {
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(SynthesizedAudio {
                bytes: format!("{}:{text}", profile.model_id).into_bytes(),
                content_type: "audio/mpeg".to_string(),
            })
        })
    }
}

fn profile(tier: VoiceTier, model_id: &str) -> VoiceProfile {
    VoiceProfile {
        tier,
        voice_id: "voice-test".to_string(),
        model_id: model_id.to_string(),
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Build the full application router with stub services that always
/// succeed.
pub fn build_test_app() -> Router {
    build_test_app_with(StubScripts::default(), StubVoices::default())
}

/// Build the full application router with the given upstream stubs.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack (CORS, request ID, timeout, tracing, panic
/// recovery). Clone the returned router to send several requests against
/// the same state.
pub fn build_test_app_with(scripts: StubScripts, voices: StubVoices) -> Router {
    let config = test_config();
    let event_bus = Arc::new(EventBus::default());
    let assets: Arc<dyn AssetStore> = Arc::new(MemoryAssetStore::new());

    let workflow = GenerationWorkflow::new(
        Arc::new(InMemoryGenerationStore::new()),
        Arc::new(scripts),
        Arc::new(voices),
        Arc::clone(&assets),
        VoiceProfiles {
            preview: profile(VoiceTier::Preview, "preview-model"),
            hq: profile(VoiceTier::Hq, "hq-model"),
        },
        Arc::clone(&event_bus),
    );

    let state = AppState {
        pool: None,
        workflow: Arc::new(workflow),
        assets,
    };

    build_app_router(state, &config)
}

/// A full, valid set of wizard answers as a JSON object.
pub fn full_answers() -> serde_json::Value {
    let answers: serde_json::Map<String, serde_json::Value> = QUESTION_KEYS
        .iter()
        .map(|key| (key.to_string(), serde_json::json!(format!("answer for {key}"))))
        .collect();
    serde_json::Value::Object(answers)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a request without an owner header.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// GET as the given owner.
pub async fn get_as(app: Router, owner: &str, uri: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("x-owner-id", owner)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST with an empty body as the given owner.
pub async fn post_as(app: Router, owner: &str, uri: &str) -> Response<Body> {
    let request = Request::post(uri)
        .header("x-owner-id", owner)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a JSON body as the given owner.
pub async fn post_json(
    app: Router,
    owner: &str,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::post(uri)
        .header("x-owner-id", owner)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// PUT a JSON body as the given owner.
pub async fn put_json(
    app: Router,
    owner: &str,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::put(uri)
        .header("x-owner-id", owner)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Create a draft for `owner` and return its id.
pub async fn create_draft(app: &Router, owner: &str) -> i64 {
    let response = post_json(
        app.clone(),
        owner,
        "/api/v1/audio-generations",
        serde_json::json!({ "answers": full_answers() }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
