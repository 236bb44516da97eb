//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the generation
//! workflow (publisher) and any number of subscribers.

use chrono::{DateTime, Utc};
use pitch_core::audio_generation::GenerationStatus;
use pitch_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Prefix shared by every generation event type.
pub const EVENT_PREFIX: &str = "audio_generation";

pub const EVENT_CREATED: &str = "audio_generation.created";
pub const EVENT_ANSWERS_REPLACED: &str = "audio_generation.answers_replaced";
pub const EVENT_SCRIPT_EDITED: &str = "audio_generation.script_edited";

// ---------------------------------------------------------------------------
// LifecycleEvent
// ---------------------------------------------------------------------------

/// Something that happened to a generation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// Dot-separated event name, e.g. `"audio_generation.script_ready"`.
    pub event_type: String,

    pub generation_id: DbId,

    /// Owner of the record, when known to the publisher.
    pub owner_id: Option<String>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    pub fn new(event_type: impl Into<String>, generation_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            generation_id,
            owner_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Event announcing that a record entered `status`.
    pub fn entered(status: GenerationStatus, generation_id: DbId) -> Self {
        Self::new(format!("{EVENT_PREFIX}.{}", status.as_str()), generation_id)
    }

    pub fn with_owner(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no subscribers the event is dropped.
    pub fn publish(&self, event: LifecycleEvent) {
        tracing::trace!(
            event_type = %event.event_type,
            generation_id = event.generation_id,
            "Publishing lifecycle event"
        );
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
