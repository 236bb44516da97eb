//! Text-to-speech client for ElevenLabs.
//!
//! Sends `POST /v1/text-to-speech/{voice_id}` and returns the raw audio
//! bytes. The preview and HQ tiers share a voice and differ only by model.

use async_trait::async_trait;
use pitch_core::upstream::{
    SynthesizedAudio, UpstreamError, VoiceProfile, VoiceSynthesizer, VoiceTier,
};
use serde::{Deserialize, Serialize};

use crate::http;

/// Service name used in error messages and logs.
pub const SERVICE: &str = "voice synthesis";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
const DEFAULT_PREVIEW_MODEL: &str = "eleven_flash_v2_5";
const DEFAULT_HQ_MODEL: &str = "eleven_multilingual_v2";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Requested encoding. Matches the `audio/mpeg` content type we store.
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Configuration for the TTS provider.
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    pub api_key: String,
    /// Base URL without a trailing slash.
    pub base_url: String,
    pub voice_id: String,
    /// Low-cost model used for previews.
    pub preview_model: String,
    /// High-quality model used for the final render.
    pub hq_model: String,
    pub timeout_secs: u64,
}

impl ElevenLabsConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env var               | Default                      |
    /// |-----------------------|------------------------------|
    /// | `ELEVENLABS_API_KEY`  | (empty)                      |
    /// | `ELEVENLABS_BASE_URL` | `https://api.elevenlabs.io`  |
    /// | `ELEVENLABS_VOICE_ID` | `21m00Tcm4TlvDq8ikWAM`       |
    /// | `PREVIEW_VOICE_MODEL` | `eleven_flash_v2_5`          |
    /// | `HQ_VOICE_MODEL`      | `eleven_multilingual_v2`     |
    /// | `TTS_TIMEOUT_SECS`    | `120`                        |
    ///
    /// # Panics
    ///
    /// Panics if `TTS_TIMEOUT_SECS` is not a valid `u64`.
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };

        let timeout_secs: u64 = var("TTS_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .expect("TTS_TIMEOUT_SECS must be a valid u64");

        Self {
            api_key: std::env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
            base_url: var("ELEVENLABS_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            voice_id: var("ELEVENLABS_VOICE_ID", DEFAULT_VOICE_ID),
            preview_model: var("PREVIEW_VOICE_MODEL", DEFAULT_PREVIEW_MODEL),
            hq_model: var("HQ_VOICE_MODEL", DEFAULT_HQ_MODEL),
            timeout_secs,
        }
    }

    pub fn preview_profile(&self) -> VoiceProfile {
        VoiceProfile {
            tier: VoiceTier::Preview,
            voice_id: self.voice_id.clone(),
            model_id: self.preview_model.clone(),
        }
    }

    pub fn hq_profile(&self) -> VoiceProfile {
        VoiceProfile {
            tier: VoiceTier::Hq,
            voice_id: self.voice_id.clone(),
            model_id: self.hq_model.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// ElevenLabs reports failures as `{"detail": {"status": ..., "message": ...}}`
/// or, for validation errors, `{"detail": [...]}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: ErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message { message: String },
    Other(serde_json::Value),
}

fn describe_error(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorEnvelope>(body).ok()?.detail {
        ErrorDetail::Message { message } => Some(message),
        ErrorDetail::Other(value) => Some(value.to_string()),
    }
}

/// Accept audio and generic binary payloads; anything else (typically a
/// JSON or HTML error page with a 200) is not audio.
fn is_audio_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.starts_with("audio/") || essence == "application/octet-stream"
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the ElevenLabs text-to-speech API.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig) -> Result<Self, reqwest::Error> {
        let client = http::build_client(config.timeout_secs)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ElevenLabsConfig {
        &self.config
    }
}

#[async_trait]
impl VoiceSynthesizer for ElevenLabsClient {
    async fn synthesize(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<SynthesizedAudio, UpstreamError> {
        if self.config.api_key.is_empty() {
            return Err(UpstreamError::Rejected {
                service: SERVICE,
                status: None,
                message: "ELEVENLABS_API_KEY is not configured".to_string(),
            });
        }

        let timeout = self.config.timeout_secs;
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.config.base_url, profile.voice_id
        );

        tracing::debug!(
            tier = ?profile.tier,
            model = %profile.model_id,
            chars = text.chars().count(),
            "Requesting speech synthesis",
        );

        let response = self
            .client
            .post(url)
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("xi-api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&SpeechRequest {
                text,
                model_id: &profile.model_id,
            })
            .send()
            .await
            .map_err(|e| http::classify(SERVICE, timeout, e))?;

        let response = http::ensure_success(SERVICE, response, describe_error).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(pitch_core::assets::DEFAULT_AUDIO_CONTENT_TYPE)
            .to_string();

        if !is_audio_content_type(&content_type) {
            return Err(UpstreamError::InvalidResponse {
                service: SERVICE,
                message: format!("expected audio, got content type '{content_type}'"),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| http::classify(SERVICE, timeout, e))?;

        if bytes.is_empty() {
            return Err(UpstreamError::InvalidResponse {
                service: SERVICE,
                message: "response contained no audio".to_string(),
            });
        }

        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
