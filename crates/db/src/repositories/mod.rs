//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod audio_generation_repo;
pub mod generation_event_repo;

pub use audio_generation_repo::AudioGenerationRepo;
pub use generation_event_repo::GenerationEventRepo;
