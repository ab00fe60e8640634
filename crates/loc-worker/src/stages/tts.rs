//! Demo voice synthesis: a sine-wave tone per translated segment,
//! concatenated into one track, standing in for a real TTS provider call
//! the way the original's `tts-agent` stub did.

use async_trait::async_trait;
use loc_core::envelope::StageWork;
use loc_core::pipeline::{Stage, stage_key};
use loc_core::subtitles::Segment;
use serde_json::json;
use tokio::process::Command;

use crate::context::run_command;
use crate::error::{StageError, StageResult};
use crate::{StageOutputs, StageWorker, WorkerContext};

pub struct TtsWorker;

#[async_trait]
impl StageWorker for TtsWorker {
    fn stage(&self) -> Stage {
        Stage::Tts
    }

    async fn process(&self, ctx: &WorkerContext<'_>, work: &StageWork) -> StageResult<StageOutputs> {
        let translate_key = stage_key(&work.base_prefix, Stage::Translate, "segments.json");
        let local = ctx.path("translated_segments.json");
        ctx.download_key(&translate_key, &local).await?;
        let bytes = tokio::fs::read(&local).await?;
        let segments: Vec<Segment> =
            serde_json::from_slice(&bytes).map_err(|e| StageError::Decode(e.to_string()))?;

        let mut concat_list = String::new();
        for (i, seg) in segments.iter().enumerate() {
            let duration = (seg.end - seg.start).max(0.1);
            // Vary the tone a little per segment rather than a flat drone.
            let frequency = 180.0 + (i % 5) as f64 * 40.0;
            let snippet_path = ctx.path(&format!("snippet_{i:03}.wav"));

            let mut command = Command::new("ffmpeg");
            command.args(["-y", "-f", "lavfi", "-i"]);
            command.arg(format!("sine=frequency={frequency}:duration={duration}"));
            command.arg(&snippet_path);
            run_command(command).await?;

            concat_list.push_str(&format!("file '{}'\n", snippet_path.display()));
        }

        let concat_list_path = ctx.path("concat_list.txt");
        tokio::fs::write(&concat_list_path, concat_list).await?;

        let voice_path = ctx.path("voice.wav");
        let mut concat_command = Command::new("ffmpeg");
        concat_command.args(["-y", "-f", "concat", "-safe", "0", "-i"]);
        concat_command.arg(&concat_list_path);
        concat_command.arg(&voice_path);
        run_command(concat_command).await?;

        ctx.upload_file(&stage_key(&work.base_prefix, Stage::Tts, "voice.wav"), &voice_path)
            .await?;

        Ok(StageOutputs {
            report: Some(json!({
                "segment_count": segments.len(),
                "voice_profile": work.voice_profile.as_ref().map(|p| p.name.clone()),
            })),
            ..Default::default()
        })
    }
}
