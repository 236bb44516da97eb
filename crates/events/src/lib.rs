//! Generation lifecycle events.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`LifecycleEvent`]: one status change or edit on a generation record.
//! - [`EventPersistence`]: background service that appends every event to
//!   the `generation_events` table.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, LifecycleEvent};
pub use persistence::EventPersistence;
