//! Demo transcription: probes the source asset's duration and fabricates
//! evenly spaced segments, exactly the "genuinely out of scope" stand-in
//! the original Python ASR agent was itself a stub for.

use async_trait::async_trait;
use loc_core::envelope::StageWork;
use loc_core::pipeline::{Stage, stage_key};
use loc_core::subtitles::{Segment, to_srt};
use serde_json::json;

use crate::context::probe_duration_seconds;
use crate::error::{StageError, StageResult};
use crate::{StageOutputs, StageWorker, WorkerContext};

const SEGMENT_LENGTH_SECONDS: f64 = 5.0;
const MAX_SEGMENTS: usize = 20;

pub struct AsrWorker;

#[async_trait]
impl StageWorker for AsrWorker {
    fn stage(&self) -> Stage {
        Stage::Asr
    }

    async fn process(&self, ctx: &WorkerContext<'_>, work: &StageWork) -> StageResult<StageOutputs> {
        let source_path = ctx.path("source.media");
        ctx.download_url(&work.source_url, &source_path).await?;

        let duration = probe_duration_seconds(&source_path).await?.max(SEGMENT_LENGTH_SECONDS);
        let segment_count = ((duration / SEGMENT_LENGTH_SECONDS).ceil() as usize).clamp(1, MAX_SEGMENTS);

        let mut segments = Vec::with_capacity(segment_count);
        for i in 0..segment_count {
            let start = i as f64 * SEGMENT_LENGTH_SECONDS;
            let end = ((i + 1) as f64 * SEGMENT_LENGTH_SECONDS).min(duration);
            segments.push(Segment {
                start,
                end,
                text: format!("[demo transcript segment {}]", i + 1),
            });
        }

        let segments_json = serde_json::to_vec_pretty(&segments)
            .map_err(|e| StageError::Decode(e.to_string()))?;
        ctx.upload_bytes(
            &stage_key(&work.base_prefix, Stage::Asr, "segments.json"),
            segments_json,
            "application/json",
        )
        .await?;

        let srt = to_srt(&segments);
        ctx.upload_bytes(
            &stage_key(&work.base_prefix, Stage::Asr, "transcript.srt"),
            srt.into_bytes(),
            "application/x-subrip",
        )
        .await?;

        Ok(StageOutputs {
            report: Some(json!({
                "duration_seconds": duration,
                "segment_count": segments.len(),
            })),
            ..Default::default()
        })
    }
}
