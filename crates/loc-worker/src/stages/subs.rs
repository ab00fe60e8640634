//! Render the translated transcript as SRT and WebVTT and publish both.
//! The variant's `subs_url` column points at the VTT copy; the SRT key is
//! carried in the report for anyone who wants the other format.

use async_trait::async_trait;
use loc_core::envelope::StageWork;
use loc_core::pipeline::{Stage, stage_key};
use loc_core::subtitles::{Segment, to_srt, to_vtt};
use serde_json::json;

use crate::error::{StageError, StageResult};
use crate::{StageOutputs, StageWorker, WorkerContext};

pub struct SubsWorker;

#[async_trait]
impl StageWorker for SubsWorker {
    fn stage(&self) -> Stage {
        Stage::Subs
    }

    async fn process(&self, ctx: &WorkerContext<'_>, work: &StageWork) -> StageResult<StageOutputs> {
        let translate_key = stage_key(&work.base_prefix, Stage::Translate, "segments.json");
        let local = ctx.path("translated_segments.json");
        ctx.download_key(&translate_key, &local).await?;

        let bytes = tokio::fs::read(&local).await?;
        let segments: Vec<Segment> =
            serde_json::from_slice(&bytes).map_err(|e| StageError::Decode(e.to_string()))?;

        let srt_key = stage_key(&work.base_prefix, Stage::Subs, "subtitles.srt");
        let srt_url = ctx
            .upload_bytes(&srt_key, to_srt(&segments).into_bytes(), "application/x-subrip")
            .await?;

        let vtt_key = stage_key(&work.base_prefix, Stage::Subs, "subtitles.vtt");
        let vtt_url = ctx
            .upload_bytes(&vtt_key, to_vtt(&segments).into_bytes(), "text/vtt")
            .await?;

        Ok(StageOutputs {
            subs_key: Some(vtt_url),
            report: Some(json!({"srt_url": srt_url, "segment_count": segments.len()})),
            ..Default::default()
        })
    }
}
