//! Demo translation: re-cases and tags each transcript segment's text
//! with its target language, standing in for the original's real machine
//! translation call.

use async_trait::async_trait;
use loc_core::envelope::StageWork;
use loc_core::pipeline::{Stage, stage_key};
use loc_core::subtitles::Segment;
use serde_json::json;

use crate::error::{StageError, StageResult};
use crate::{StageOutputs, StageWorker, WorkerContext};

pub struct TranslateWorker;

#[async_trait]
impl StageWorker for TranslateWorker {
    fn stage(&self) -> Stage {
        Stage::Translate
    }

    async fn process(&self, ctx: &WorkerContext<'_>, work: &StageWork) -> StageResult<StageOutputs> {
        let asr_key = stage_key(&work.base_prefix, Stage::Asr, "segments.json");
        let local = ctx.path("asr_segments.json");
        ctx.download_key(&asr_key, &local).await?;

        let bytes = tokio::fs::read(&local).await?;
        let segments: Vec<Segment> =
            serde_json::from_slice(&bytes).map_err(|e| StageError::Decode(e.to_string()))?;

        let translated: Vec<Segment> = segments
            .into_iter()
            .map(|seg| Segment {
                text: format!("[{}] {}", work.lang.to_uppercase(), seg.text),
                ..seg
            })
            .collect();

        let out = serde_json::to_vec_pretty(&translated)
            .map_err(|e| StageError::Decode(e.to_string()))?;
        ctx.upload_bytes(
            &stage_key(&work.base_prefix, Stage::Translate, "segments.json"),
            out,
            "application/json",
        )
        .await?;

        Ok(StageOutputs {
            report: Some(json!({"lang": work.lang, "segment_count": translated.len()})),
            ..Default::default()
        })
    }
}
