//! Generation workflow: the record store abstraction and the controller
//! that drives a record from draft to HQ audio.
//!
//! - [`store`]: [`GenerationStore`] trait with its compare-and-set
//!   contract, plus the PostgreSQL implementation.
//! - [`memory`]: in-process [`GenerationStore`] for tests and
//!   database-less development runs.
//! - [`workflow`]: [`GenerationWorkflow`], the only writer of record status.

pub mod error;
pub mod memory;
pub mod store;
pub mod workflow;

pub use error::GenerationError;
pub use memory::InMemoryGenerationStore;
pub use store::{GenerationStore, PgGenerationStore, StoreError};
pub use workflow::{GenerationWorkflow, VoiceProfiles};
