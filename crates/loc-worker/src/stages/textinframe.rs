//! Burn a localized caption directly into the frame via ffmpeg's `drawtext`
//! filter and re-package the HLS preview against the result. Runs after
//! `mix`; when enabled it overwrites the variant's `video_url` and
//! `preview_url`, leaving the separately-extracted `audio_url` untouched.

use async_trait::async_trait;
use loc_core::envelope::StageWork;
use loc_core::pipeline::{Stage, stage_key};
use serde_json::json;
use tokio::process::Command;

use crate::context::run_command;
use crate::error::StageResult;
use crate::{StageOutputs, StageWorker, WorkerContext};

pub struct TextinframeWorker;

#[async_trait]
impl StageWorker for TextinframeWorker {
    fn stage(&self) -> Stage {
        Stage::Textinframe
    }

    async fn process(&self, ctx: &WorkerContext<'_>, work: &StageWork) -> StageResult<StageOutputs> {
        let mix_key = stage_key(&work.base_prefix, Stage::Mix, "video.mp4");
        let source_video = ctx.path("mixed.mp4");
        ctx.download_key(&mix_key, &source_video).await?;

        let caption = escape_drawtext(&format!("Localized: {}", work.lang.to_uppercase()));
        let video_path = ctx.path("video.mp4");
        let mut command = Command::new("ffmpeg");
        command.args(["-y", "-i"]);
        command.arg(&source_video);
        command.arg("-vf");
        command.arg(format!(
            "drawtext=text='{caption}':x=10:y=10:fontcolor=white:fontsize=24:box=1:boxcolor=black@0.5"
        ));
        command.args(["-c:a", "copy"]);
        command.arg(&video_path);
        run_command(command).await?;

        let preview_path = ctx.path("preview.m3u8");
        let mut hls_command = Command::new("ffmpeg");
        hls_command.args(["-y", "-i"]);
        hls_command.arg(&video_path);
        hls_command.args([
            "-c",
            "copy",
            "-f",
            "hls",
            "-hls_time",
            "6",
            "-hls_playlist_type",
            "vod",
        ]);
        hls_command.arg(&preview_path);
        run_command(hls_command).await?;

        let video_url = ctx
            .upload_file(&stage_key(&work.base_prefix, Stage::Textinframe, "video.mp4"), &video_path)
            .await?;
        let preview_url = ctx
            .upload_file(
                &stage_key(&work.base_prefix, Stage::Textinframe, "preview.m3u8"),
                &preview_path,
            )
            .await?;

        Ok(StageOutputs {
            video_key: Some(video_url),
            preview_key: Some(preview_url),
            report: Some(json!({"caption": caption})),
            ..Default::default()
        })
    }
}

/// ffmpeg's drawtext filter treats `:`, `'` and `\` specially inside its
/// option string; escape them so a language code or future free-text
/// caption can never break the filter graph.
fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}
