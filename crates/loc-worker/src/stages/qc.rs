//! Final quality check: probes the variant's finished video (`textinframe`'s
//! output if that stage ran, otherwise `mix`'s) and records a pass/fail
//! report. The only stage that never touches any of the four URL columns.

use async_trait::async_trait;
use loc_core::envelope::StageWork;
use loc_core::pipeline::{Stage, stage_key};
use serde_json::json;

use crate::context::{probe_duration_seconds, run_command};
use crate::error::StageResult;
use crate::{StageOutputs, StageWorker, WorkerContext};

pub struct QcWorker;

#[async_trait]
impl StageWorker for QcWorker {
    fn stage(&self) -> Stage {
        Stage::Qc
    }

    async fn process(&self, ctx: &WorkerContext<'_>, work: &StageWork) -> StageResult<StageOutputs> {
        let upstream = if work.options.replace_text_in_frame {
            Stage::Textinframe
        } else {
            Stage::Mix
        };
        let video_key = stage_key(&work.base_prefix, upstream, "video.mp4");
        let video_path = ctx.path("final.mp4");
        ctx.download_key(&video_key, &video_path).await?;

        let duration = probe_duration_seconds(&video_path).await?;
        let has_audio = probe_has_audio_stream(&video_path).await?;
        let checks_passed = duration > 0.0 && has_audio;

        Ok(StageOutputs {
            report: Some(json!({
                "video_duration_seconds": duration,
                "has_audio": has_audio,
                "checks_passed": checks_passed,
            })),
            ..Default::default()
        })
    }
}

/// `ffprobe -v error -select_streams a -show_entries stream=index -of csv=p=0`:
/// any non-empty stdout means at least one audio stream is present.
async fn probe_has_audio_stream(path: &std::path::Path) -> StageResult<bool> {
    let workdir = path.parent().expect("video path has a parent");
    let report_path = workdir.join("audio_streams.txt");

    let mut command = tokio::process::Command::new("sh");
    command.arg("-c");
    command.arg(format!(
        "ffprobe -v error -select_streams a -show_entries stream=index -of csv=p=0 '{}' > '{}'",
        path.display(),
        report_path.display()
    ));
    run_command(command).await?;

    let contents = tokio::fs::read_to_string(&report_path).await.unwrap_or_default();
    Ok(!contents.trim().is_empty())
}
