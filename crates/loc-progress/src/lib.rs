//! Fire-and-forget progress fan-out over Redis pub/sub.
//!
//! Every stage transition publishes one [`ProgressEvent`] to the
//! `job:<job_id>` channel. There is no persistence and no replay buffer —
//! a subscriber only ever sees events published after it subscribes,
//! which is why the SSE relay in `loc-api` opens its subscription before
//! it does anything else.

pub mod error;

pub use error::{ProgressError, ProgressResult};

use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use loc_core::ResourceId;
use loc_core::pipeline::Stage;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// One progress update for a single `(job, variant, stage)`. Serialized
/// as-is onto the wire; field order and names match the original
/// service's payload so any existing dashboard consuming the Redis
/// channel keeps working unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: ResourceId,
    pub stage: String,
    pub lang: Option<String>,
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(
        job_id: ResourceId,
        stage: Stage,
        status: &str,
        lang: Option<&str>,
    ) -> Self {
        Self {
            job_id,
            stage: stage.as_str().to_string(),
            lang: lang.map(str::to_string),
            status: status.to_string(),
            progress: 0.0,
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

fn channel_name(job_id: ResourceId) -> String {
    format!("job:{job_id}")
}

/// A connected publisher. Cloning is cheap — `MultiplexedConnection` is
/// already a shared handle.
#[derive(Clone)]
pub struct ProgressChannel {
    client: redis::Client,
    conn: MultiplexedConnection,
}

impl ProgressChannel {
    pub async fn connect(redis_url: &str) -> ProgressResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { client, conn })
    }

    /// Publish one event. Returns an error on transport failure so
    /// callers can decide whether to log-and-continue (the common case,
    /// since progress is observability, not pipeline state) or retry.
    pub async fn publish_job_event(&self, event: &ProgressEvent) -> ProgressResult<()> {
        let payload = serde_json::to_string(event)?;
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(channel_name(event.job_id), payload)
            .await?;
        Ok(())
    }

    /// Best-effort variant for the orchestrator's and workers' hot path:
    /// a progress-channel outage must never fail a stage or block the
    /// pipeline, so failures are logged and swallowed.
    pub async fn publish_job_event_best_effort(&self, event: &ProgressEvent) {
        if let Err(err) = self.publish_job_event(event).await {
            warn!(job_id = %event.job_id, error = %err, "failed to publish progress event");
        }
    }

    /// Subscribe to `job_id`'s channel on a dedicated pub/sub connection.
    /// The returned stream ends when the connection is dropped or the
    /// broker closes it; callers (the SSE relay) are responsible for
    /// tearing it down on client disconnect or timeout.
    pub async fn subscribe_job_events(
        &self,
        job_id: ResourceId,
    ) -> ProgressResult<impl Stream<Item = ProgressEvent> + Send> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(channel_name(job_id)).await?;
        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            match serde_json::from_str::<ProgressEvent>(&payload) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!(error = %err, "dropping malformed progress event");
                    None
                }
            }
        });
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_name_is_job_scoped() {
        let id = ResourceId::new();
        assert_eq!(channel_name(id), format!("job:{id}"));
    }

    #[test]
    fn builder_methods_set_optional_fields() {
        let id = ResourceId::new();
        let event = ProgressEvent::new(id, Stage::Mix, "processing", Some("fr"))
            .with_progress(0.5)
            .with_message("muxing audio");
        assert_eq!(event.progress, 0.5);
        assert_eq!(event.message.as_deref(), Some("muxing audio"));
        assert_eq!(event.lang.as_deref(), Some("fr"));
        assert_eq!(event.stage, "mix");
    }

    #[test]
    fn serializes_with_original_field_names() {
        let id = ResourceId::new();
        let event = ProgressEvent::new(id, Stage::Asr, "queued", None);
        let json = serde_json::to_value(&event).unwrap();
        for field in ["job_id", "stage", "lang", "status", "progress", "message", "timestamp"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }
}
