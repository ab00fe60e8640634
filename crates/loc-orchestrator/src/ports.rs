//! Seams the orchestrator's core logic is tested against, so the six
//! literal scenarios and the duplicate/idempotency properties can run
//! without a real broker, database, or Redis instance.

use async_trait::async_trait;
use loc_core::envelope::BusMessage;
use loc_progress::ProgressEvent;

use crate::error::OrchestratorResult;

/// Publishes a message under a routing key on the `jobs` topic exchange.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, routing_key: &str, message: &BusMessage) -> OrchestratorResult<()>;
}

#[async_trait]
impl Publisher for loc_bus::MessageBus {
    async fn publish(&self, routing_key: &str, message: &BusMessage) -> OrchestratorResult<()> {
        loc_bus::MessageBus::publish(self, routing_key, message)
            .await
            .map_err(Into::into)
    }
}

/// Fans a progress event out to `job:<job_id>`. Best-effort: a progress
/// channel outage must never fail stage advancement.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn publish(&self, event: ProgressEvent);
}

#[async_trait]
impl ProgressSink for loc_progress::ProgressChannel {
    async fn publish(&self, event: ProgressEvent) {
        self.publish_job_event_best_effort(&event).await;
    }
}
