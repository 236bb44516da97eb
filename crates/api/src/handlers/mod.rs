pub mod audio_assets;
pub mod audio_generation;
