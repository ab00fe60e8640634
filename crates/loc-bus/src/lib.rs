//! The `jobs` topic exchange the orchestrator, stage workers, and the
//! YouTube uploader all publish to and consume from.
//!
//! Queue/routing-key shape is unchanged from the original service:
//! a single durable topic exchange named `jobs`, with routing keys
//! `job.created`, `stage.<name>`, `stage.<name>.completed`,
//! `stage.<name>.failed`, and `youtube.upload`. Every message is one
//! [`loc_core::envelope::BusMessage`] variant, serialized to JSON.

pub mod error;

pub use error::{BusError, BusResult};

use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer, ExchangeKind};
use loc_core::envelope::BusMessage;
use tracing::debug;

const EXCHANGE: &str = "jobs";

/// A connected channel on the `jobs` topic exchange. Cheap to clone —
/// `lapin::Channel` is already a handle onto a shared connection.
#[derive(Clone)]
pub struct MessageBus {
    channel: Channel,
}

impl MessageBus {
    /// Connect to `amqp_url`, open one channel, and cap unacked messages
    /// per consumer at `prefetch` (5-10 is the original service's own
    /// setting; higher values trade throughput for redelivery blast
    /// radius on a worker crash).
    pub async fn connect(amqp_url: &str, prefetch: u16) -> BusResult<Self> {
        let connection =
            Connection::connect(amqp_url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await?;
        Ok(Self { channel })
    }

    async fn declare_exchange(&self) -> BusResult<()> {
        self.channel
            .exchange_declare(
                EXCHANGE,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    /// Declare `queue` durable and bind it to `routing_key` on the `jobs`
    /// exchange. Idempotent — safe to call on every process start.
    pub async fn declare_queue(&self, queue: &str, routing_key: &str) -> BusResult<()> {
        self.declare_exchange().await?;
        self.channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        self.channel
            .queue_bind(
                queue,
                EXCHANGE,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }

    /// Publish `message` under `routing_key`. Waits for the broker's
    /// publish confirmation before returning.
    pub async fn publish(&self, routing_key: &str, message: &BusMessage) -> BusResult<()> {
        self.declare_exchange().await?;
        let body = serde_json::to_vec(message)?;
        debug!(routing_key, "publishing bus message");
        self.channel
            .basic_publish(
                EXCHANGE,
                routing_key,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default(),
            )
            .await?
            .await?;
        Ok(())
    }

    /// Start consuming `queue`. Callers decode each delivery with
    /// [`decode`] and ack/nack it themselves once the corresponding
    /// terminal event has been published — the bus never acks on a
    /// caller's behalf.
    pub async fn consume(&self, queue: &str, consumer_tag: &str) -> BusResult<Consumer> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;
        Ok(consumer)
    }
}

/// Deserialize a delivery's JSON body into a [`BusMessage`].
pub fn decode(payload: &[u8]) -> BusResult<BusMessage> {
    Ok(serde_json::from_slice(payload)?)
}

/// Ack a delivery once its terminal event (a `StageResult`, or a
/// persisted job/variant update) has been durably published.
pub async fn ack(delivery: &lapin::message::Delivery) -> BusResult<()> {
    delivery.ack(BasicAckOptions::default()).await?;
    Ok(())
}

/// Nack a delivery and requeue it — used for transport/transient
/// failures, never for a stage that ran and failed (those publish a
/// failed `StageResult` and ack normally).
pub async fn nack_requeue(delivery: &lapin::message::Delivery) -> BusResult<()> {
    delivery
        .nack(BasicNackOptions {
            requeue: true,
            ..Default::default()
        })
        .await?;
    Ok(())
}

/// Routing key for a job-created announcement.
pub fn job_created_key() -> &'static str {
    "job.created"
}

/// Routing key a stage worker of kind `stage` consumes work from.
pub fn stage_work_key(stage: loc_core::pipeline::Stage) -> String {
    format!("stage.{}", stage.as_str())
}

/// Routing key a stage's successful completion is published under.
pub fn stage_completed_key(stage: loc_core::pipeline::Stage) -> String {
    format!("stage.{}.completed", stage.as_str())
}

/// Routing key a stage's failure is published under.
pub fn stage_failed_key(stage: loc_core::pipeline::Stage) -> String {
    format!("stage.{}.failed", stage.as_str())
}

/// Wildcard binding the orchestrator uses to receive every stage's
/// completions and failures on one queue.
pub fn stage_events_wildcards() -> [&'static str; 2] {
    ["stage.*.completed", "stage.*.failed"]
}

/// Routing key for the post-pipeline YouTube upload hook.
pub fn youtube_upload_key() -> &'static str {
    "youtube.upload"
}

#[cfg(test)]
mod tests {
    use super::*;
    use loc_core::pipeline::Stage;

    #[test]
    fn stage_routing_keys_match_original_naming() {
        assert_eq!(stage_work_key(Stage::Asr), "stage.asr");
        assert_eq!(stage_completed_key(Stage::Mix), "stage.mix.completed");
        assert_eq!(stage_failed_key(Stage::Qc), "stage.qc.failed");
    }

    #[test]
    fn fixed_routing_keys_are_stable() {
        assert_eq!(job_created_key(), "job.created");
        assert_eq!(youtube_upload_key(), "youtube.upload");
        assert_eq!(stage_events_wildcards(), ["stage.*.completed", "stage.*.failed"]);
    }
}
