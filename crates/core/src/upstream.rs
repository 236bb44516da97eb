//! Outbound service contracts: AI script generation and voice synthesis.
//!
//! Implementations live in `pitch-providers`. Each call is a single
//! request/response with no internal retries; failures are classified into
//! [`UpstreamError`] so the workflow can record a meaningful reason.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Classified failure of a hosted AI or TTS call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// No complete response within the configured timeout.
    #[error("{service} did not respond within {timeout_secs}s")]
    Timeout {
        service: &'static str,
        timeout_secs: u64,
    },

    /// The call failed outright: unreachable host or a non-2xx status.
    #[error("{service} rejected the request: {message}")]
    Rejected {
        service: &'static str,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        message: String,
    },

    /// A 2xx response whose body is empty or not in the expected shape.
    #[error("{service} returned an invalid response: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}

impl UpstreamError {
    /// Stable category name, used as the prefix of persisted failure reasons.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "UpstreamTimeout",
            Self::Rejected { .. } => "UpstreamRejected",
            Self::InvalidResponse { .. } => "UpstreamInvalidResponse",
        }
    }
}

// ---------------------------------------------------------------------------
// Voice profiles
// ---------------------------------------------------------------------------

/// TTS quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceTier {
    /// Low-cost, low-latency model used for previews.
    Preview,
    /// High-quality model used for the final render.
    Hq,
}

/// Selects the TTS model and voice for one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub tier: VoiceTier,
    pub voice_id: String,
    pub model_id: String,
}

/// Rendered audio returned by a [`VoiceSynthesizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    /// MIME type reported by the provider, e.g. `audio/mpeg`.
    pub content_type: String,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Hosted chat-completion model that writes pitch scripts.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Produce a script for `prompt`. Returned text is non-empty.
    async fn generate_script(&self, prompt: &str) -> Result<String, UpstreamError>;
}

/// Hosted text-to-speech service.
#[async_trait]
pub trait VoiceSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<SynthesizedAudio, UpstreamError>;
}
