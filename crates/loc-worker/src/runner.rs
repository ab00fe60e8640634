//! The shared consumer loop every stage binary runs.
//!
//! Binds one competing consumer to `stage.<name>`, and for every delivery:
//! decodes the envelope, opens a scratch [`tempfile::TempDir`], runs the
//! stage's `process` guarded by `catch_unwind` so a transform panic
//! becomes a failed `StageResult` instead of killing the process, and
//! publishes the terminal result before acking. A delivery is only ever
//! nacked for a transport-level problem (malformed payload, unreachable
//! bus) that happens before a terminal event is in flight — once the
//! transform has actually run, success or failure, the outcome is always
//! durably published and the delivery acked, matching the ack-after-
//! terminal-event discipline in the orchestrator's own dispatch loop.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use loc_bus::MessageBus;
use loc_core::envelope::{BusMessage, StageResult as StageResultEnvelope};
use loc_progress::ProgressChannel;
use loc_storage::ObjectStore;
use tracing::{error, info, warn};

use crate::context::WorkerContext;
use crate::{StageOutputs, StageWorker};

pub async fn run_worker(
    bus: MessageBus,
    storage: ObjectStore,
    progress: ProgressChannel,
    worker: Arc<dyn StageWorker>,
) -> loc_bus::BusResult<()> {
    let stage = worker.stage();
    let queue = format!("{}-agent", stage.as_str());
    bus.declare_queue(&queue, &loc_bus::stage_work_key(stage)).await?;
    let mut consumer = bus.consume(&queue, &queue).await?;

    info!(stage = stage.as_str(), "stage worker consuming");

    while let Some(delivery) = consumer.next().await {
        let Ok(delivery) = delivery else {
            warn!(stage = stage.as_str(), "delivery error, skipping");
            continue;
        };

        let work = match loc_bus::decode(&delivery.data) {
            Ok(BusMessage::StageWork(work)) if work.stage == stage => work,
            Ok(_) => {
                warn!(stage = stage.as_str(), "unexpected message kind, acking and dropping");
                let _ = loc_bus::ack(&delivery).await;
                continue;
            }
            Err(err) => {
                warn!(stage = stage.as_str(), error = %err, "malformed delivery, acking and dropping");
                let _ = loc_bus::ack(&delivery).await;
                continue;
            }
        };

        let tempdir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(err) => {
                error!(stage = stage.as_str(), error = %err, "failed to create scratch dir, nacking");
                let _ = loc_bus::nack_requeue(&delivery).await;
                continue;
            }
        };

        progress
            .publish_job_event_best_effort(&loc_progress::ProgressEvent::new(
                work.job_id,
                stage,
                "processing",
                Some(&work.lang),
            ))
            .await;

        let ctx = WorkerContext {
            storage: &storage,
            workdir: tempdir.path(),
        };
        let outcome = AssertUnwindSafe(worker.process(&ctx, &work)).catch_unwind().await;

        let result = match outcome {
            Ok(Ok(outputs)) => success_result(&work, outputs),
            Ok(Err(err)) => {
                warn!(job_id = %work.job_id, variant_id = %work.variant_id, stage = stage.as_str(), error = %err, "stage failed");
                failure_result(&work, err.to_string())
            }
            Err(_) => {
                error!(job_id = %work.job_id, variant_id = %work.variant_id, stage = stage.as_str(), "stage panicked");
                failure_result(&work, "stage panicked".to_string())
            }
        };

        let routing_key = if result.ok {
            loc_bus::stage_completed_key(stage)
        } else {
            loc_bus::stage_failed_key(stage)
        };

        if let Err(err) = bus
            .publish(&routing_key, &BusMessage::StageResult(result))
            .await
        {
            error!(stage = stage.as_str(), error = %err, "failed to publish stage result, nacking for redelivery");
            let _ = loc_bus::nack_requeue(&delivery).await;
            continue;
        }

        if let Err(err) = loc_bus::ack(&delivery).await {
            error!(stage = stage.as_str(), error = %err, "failed to ack delivery after publishing result");
        }
        // tempdir drops here, deleting the scratch directory.
    }

    Ok(())
}

fn success_result(work: &loc_core::envelope::StageWork, outputs: StageOutputs) -> StageResultEnvelope {
    StageResultEnvelope {
        job_id: work.job_id,
        variant_id: work.variant_id,
        lang: work.lang.clone(),
        stage: work.stage,
        ok: true,
        error_message: None,
        video_key: outputs.video_key,
        audio_key: outputs.audio_key,
        subs_key: outputs.subs_key,
        preview_key: outputs.preview_key,
        report: outputs.report,
    }
}

fn failure_result(work: &loc_core::envelope::StageWork, message: String) -> StageResultEnvelope {
    StageResultEnvelope {
        job_id: work.job_id,
        variant_id: work.variant_id,
        lang: work.lang.clone(),
        stage: work.stage,
        ok: false,
        error_message: Some(message),
        video_key: None,
        audio_key: None,
        subs_key: None,
        preview_key: None,
        report: None,
    }
}
