//! Hosted-service adapters for the pitch generator.
//!
//! - [`openai`]: chat-completion client implementing
//!   [`ScriptGenerator`](pitch_core::upstream::ScriptGenerator).
//! - [`elevenlabs`]: text-to-speech client implementing
//!   [`VoiceSynthesizer`](pitch_core::upstream::VoiceSynthesizer).
//! - [`storage`]: filesystem and in-memory
//!   [`AssetStore`](pitch_core::assets::AssetStore) implementations.
//!
//! Clients make exactly one HTTP request per call and never retry.

pub mod elevenlabs;
mod http;
pub mod openai;
pub mod storage;

pub use elevenlabs::{ElevenLabsClient, ElevenLabsConfig};
pub use openai::{OpenAiConfig, OpenAiScriptClient};
pub use storage::{LocalAssetStore, MemoryAssetStore};
