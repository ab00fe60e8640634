//! Job creation, reads, and the SSE progress relay.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::Json;
use futures::{Stream, StreamExt};
use loc_core::ResourceId;
use loc_core::domain::{Job, JobOptions, Variant};
use loc_core::envelope::{BusMessage, JobCreated};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::AppState;
use crate::error::ApiError;

const STREAM_CHANNEL_CAPACITY: usize = 32;
const STREAM_HARD_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/stream", get(stream_job))
}

#[derive(Debug, Deserialize)]
struct CreateJobRequest {
    project_id: ResourceId,
    source_asset_id: ResourceId,
    voice_profile_id: Option<ResourceId>,
    languages: Vec<String>,
    #[serde(default)]
    options: JobOptions,
}

#[derive(Debug, Serialize)]
struct JobView {
    #[serde(flatten)]
    job: Job,
    variants: Vec<Variant>,
}

async fn create_job(
    State(state): State<AppState>,
    Json(req): Json<CreateJobRequest>,
) -> Result<Json<JobView>, ApiError> {
    if req.languages.is_empty() {
        return Err(ApiError::BadRequest("languages must not be empty".into()));
    }
    let mut seen = std::collections::HashSet::new();
    if !req.languages.iter().all(|lang| seen.insert(lang)) {
        return Err(ApiError::BadRequest("languages must not contain duplicates".into()));
    }

    let (job, variants) = state
        .jobs
        .create_job_with_variants(
            req.project_id,
            req.source_asset_id,
            req.voice_profile_id,
            &req.languages,
            req.options,
        )
        .await?;

    state
        .bus
        .publish(
            loc_bus::job_created_key(),
            &BusMessage::JobCreated(JobCreated {
                job_id: job.id,
                project_id: job.project_id,
                source_asset_id: job.source_asset_id,
                voice_profile_id: job.voice_profile_id,
                languages: job.languages.clone(),
                options: job.options,
            }),
        )
        .await?;

    Ok(Json(JobView { job, variants }))
}

async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<ResourceId>,
) -> Result<Json<JobView>, ApiError> {
    let (job, variants) = state.jobs.fetch_job(id).await?;
    Ok(Json(JobView { job, variants }))
}

/// Pairs a [`ReceiverStream`] with the [`tokio::task::JoinHandle`] feeding
/// it, aborting that task the moment this stream is dropped — the client
/// disconnecting, the 30-minute deadline firing, or axum dropping the
/// response body all go through the same `Drop`, so the upstream Redis
/// subscription never outlives its SSE connection.
struct AbortOnDrop<S> {
    inner: S,
    handle: tokio::task::JoinHandle<()>,
}

impl<S> Drop for AbortOnDrop<S> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl<S: Stream + Unpin> Stream for AbortOnDrop<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

async fn stream_job(
    State(state): State<AppState>,
    Path(id): Path<ResourceId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // Confirm the job exists before opening the subscription — an SSE
    // stream for an unknown job should 404, not open and sit idle.
    state.jobs.fetch_job(id).await?;

    let upstream = state.progress.subscribe_job_events(id).await?;
    let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

    let handle = tokio::spawn(async move {
        tokio::pin!(upstream);
        let deadline = tokio::time::sleep(STREAM_HARD_TIMEOUT);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                _ = &mut deadline => {
                    warn!(job_id = %id, "sse stream hit its 30 minute hard timeout");
                    break;
                }
                event = upstream.next() => {
                    match event {
                        Some(event) => {
                            if tx.send(event).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok(Event::default().event("update").data(data))
    });

    let guarded = AbortOnDrop { inner: stream, handle };

    Ok(Sse::new(guarded).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}
