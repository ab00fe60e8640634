//! Bus consumer wiring.
//!
//! Two durable queues: `orchestrator.jobs` bound to `job.created`, and
//! `orchestrator.stage_events` bound to both stage wildcards. Each
//! delivery is decoded, routed to the matching [`Orchestrator`] handler,
//! and acked only once the handler returns — a handler error leaves the
//! delivery unacked so the broker redelivers it instead of silently
//! dropping a stage result.

use std::sync::Arc;

use futures::StreamExt;
use loc_bus::MessageBus;
use loc_core::envelope::BusMessage;
use tracing::{error, warn};

use crate::handlers::Orchestrator;

const JOBS_QUEUE: &str = "orchestrator.jobs";
const STAGE_EVENTS_QUEUE: &str = "orchestrator.stage_events";

/// Declare the orchestrator's queues and bindings. Safe to call on every
/// process start.
pub async fn declare_queues(bus: &MessageBus) -> loc_bus::BusResult<()> {
    bus.declare_queue(JOBS_QUEUE, loc_bus::job_created_key()).await?;
    for wildcard in loc_bus::stage_events_wildcards() {
        bus.declare_queue(STAGE_EVENTS_QUEUE, wildcard).await?;
    }
    Ok(())
}

/// Run both consumer loops until either stream ends (connection loss).
/// Intended to be wrapped in a reconnect loop by the caller.
pub async fn run(bus: MessageBus, orchestrator: Arc<Orchestrator>) -> loc_bus::BusResult<()> {
    let jobs_consumer = bus.consume(JOBS_QUEUE, "orchestrator-jobs").await?;
    let stage_events_consumer = bus.consume(STAGE_EVENTS_QUEUE, "orchestrator-stage-events").await?;

    let jobs_orchestrator = orchestrator.clone();
    let jobs_task = tokio::spawn(async move {
        let mut consumer = jobs_consumer;
        while let Some(delivery) = consumer.next().await {
            let Ok(delivery) = delivery else {
                warn!("orchestrator.jobs delivery error, skipping");
                continue;
            };
            match loc_bus::decode(&delivery.data) {
                Ok(BusMessage::JobCreated(msg)) => {
                    match jobs_orchestrator.handle_job_created(&msg).await {
                        Ok(()) => {
                            if let Err(err) = loc_bus::ack(&delivery).await {
                                error!(error = %err, "failed to ack job.created delivery");
                            }
                        }
                        Err(err) => {
                            error!(job_id = %msg.job_id, error = %err, "handle_job_created failed, nacking for redelivery");
                            let _ = loc_bus::nack_requeue(&delivery).await;
                        }
                    }
                }
                Ok(other) => {
                    warn!(?other, "unexpected message on orchestrator.jobs, acking and dropping");
                    let _ = loc_bus::ack(&delivery).await;
                }
                Err(err) => {
                    warn!(error = %err, "malformed delivery on orchestrator.jobs, acking and dropping");
                    let _ = loc_bus::ack(&delivery).await;
                }
            }
        }
    });

    let stage_events_orchestrator = orchestrator.clone();
    let stage_events_task = tokio::spawn(async move {
        let mut consumer = stage_events_consumer;
        while let Some(delivery) = consumer.next().await {
            let Ok(delivery) = delivery else {
                warn!("orchestrator.stage_events delivery error, skipping");
                continue;
            };
            match loc_bus::decode(&delivery.data) {
                Ok(BusMessage::StageResult(result)) => {
                    match stage_events_orchestrator.handle_stage_result(&result).await {
                        Ok(()) => {
                            if let Err(err) = loc_bus::ack(&delivery).await {
                                error!(error = %err, "failed to ack stage result delivery");
                            }
                        }
                        Err(err) => {
                            error!(job_id = %result.job_id, stage = result.stage.as_str(), error = %err, "handle_stage_result failed, nacking for redelivery");
                            let _ = loc_bus::nack_requeue(&delivery).await;
                        }
                    }
                }
                Ok(other) => {
                    warn!(?other, "unexpected message on orchestrator.stage_events, acking and dropping");
                    let _ = loc_bus::ack(&delivery).await;
                }
                Err(err) => {
                    warn!(error = %err, "malformed delivery on orchestrator.stage_events, acking and dropping");
                    let _ = loc_bus::ack(&delivery).await;
                }
            }
        }
    });

    let _ = tokio::try_join!(jobs_task, stage_events_task);
    Ok(())
}
