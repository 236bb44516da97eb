//! Audio asset storage contract and reference format.
//!
//! Stored audio is addressed by an opaque reference of the form
//! `<uuid>.<ext>`. References are validated before any lookup so they can
//! never escape the storage root.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::upstream::SynthesizedAudio;

/// MIME type used when the provider does not report one.
pub const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\.(mp3|wav|ogg|pcm)$")
        .expect("asset reference regex is valid")
});

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Invalid asset reference: {0}")]
    InvalidReference(String),

    #[error("Asset storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audio bytes read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Durable storage for rendered audio.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist `audio`, returning its opaque reference.
    async fn store(&self, audio: &SynthesizedAudio) -> Result<String, AssetError>;

    async fn load(&self, reference: &str) -> Result<StoredAsset, AssetError>;

    /// Delete a stored asset. Removing an unknown reference succeeds.
    async fn remove(&self, reference: &str) -> Result<(), AssetError>;
}

/// Reject anything that is not a well-formed asset reference.
pub fn validate_reference(reference: &str) -> Result<(), AssetError> {
    if REFERENCE_RE.is_match(reference) {
        Ok(())
    } else {
        Err(AssetError::InvalidReference(reference.to_string()))
    }
}

/// File extension for a provider MIME type. Unknown types fall back to `mp3`.
pub fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    match essence {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/pcm" | "audio/l16" => "pcm",
        _ => "mp3",
    }
}

/// MIME type served for a stored reference.
pub fn content_type_for(reference: &str) -> &'static str {
    match reference.rsplit('.').next() {
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("pcm") => "audio/pcm",
        _ => DEFAULT_AUDIO_CONTENT_TYPE,
    }
}
