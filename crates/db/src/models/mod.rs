//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - Patch or query types used by the repository

pub mod audio_generation;
pub mod generation_event;
