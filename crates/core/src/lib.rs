//! Pure domain logic for the sales-pitch audio generator.
//!
//! Nothing in this crate performs I/O. The wizard, prompt template and
//! status machine are plain functions; the outbound services (AI script
//! generation, voice synthesis, asset storage) are described by traits in
//! [`upstream`] and [`assets`] and implemented elsewhere.

pub mod assets;
pub mod audio_generation;
pub mod error;
pub mod prompt;
pub mod types;
pub mod upstream;
pub mod wizard;
