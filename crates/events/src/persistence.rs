//! Durable event persistence service.
//!
//! [`EventPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and appends every [`LifecycleEvent`] to the `generation_events` table. It
//! runs as a long-lived background task and exits when the bus is dropped.

use pitch_core::types::DbId;
use pitch_db::repositories::GenerationEventRepo;
use pitch_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::LifecycleEvent;

/// Background service that persists lifecycle events.
pub struct EventPersistence;

impl EventPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<LifecycleEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_type = %event.event_type,
                            generation_id = event.generation_id,
                            "Failed to persist lifecycle event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Event persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &LifecycleEvent) -> Result<DbId, sqlx::Error> {
        GenerationEventRepo::insert(
            pool,
            event.generation_id,
            &event.event_type,
            event.owner_id.as_deref(),
            &event.payload,
        )
        .await
    }
}
