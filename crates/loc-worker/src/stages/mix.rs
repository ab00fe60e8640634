//! Mux the synthesized voice track (if any) onto the source video, extract
//! a standalone audio track, and package a short HLS preview — the three
//! artifacts a variant's row actually tracks once the pipeline reaches the
//! point of having a watchable result.

use async_trait::async_trait;
use loc_core::envelope::StageWork;
use loc_core::pipeline::{Stage, stage_key};
use serde_json::json;
use tokio::process::Command;

use crate::context::run_command;
use crate::error::StageResult;
use crate::{StageOutputs, StageWorker, WorkerContext};

pub struct MixWorker;

#[async_trait]
impl StageWorker for MixWorker {
    fn stage(&self) -> Stage {
        Stage::Mix
    }

    async fn process(&self, ctx: &WorkerContext<'_>, work: &StageWork) -> StageResult<StageOutputs> {
        let source_path = ctx.path("source.media");
        ctx.download_url(&work.source_url, &source_path).await?;

        let video_path = ctx.path("video.mp4");
        if work.expect_tts {
            let voice_key = stage_key(&work.base_prefix, Stage::Tts, "voice.wav");
            let voice_path = ctx.path("voice.wav");
            ctx.download_key(&voice_key, &voice_path).await?;

            let mut command = Command::new("ffmpeg");
            command.args(["-y", "-i"]);
            command.arg(&source_path);
            command.arg("-i");
            command.arg(&voice_path);
            command.args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-shortest"]);
            command.arg(&video_path);
            run_command(command).await?;
        } else {
            let mut command = Command::new("ffmpeg");
            command.args(["-y", "-i"]);
            command.arg(&source_path);
            command.args(["-c", "copy"]);
            command.arg(&video_path);
            run_command(command).await?;
        }

        let audio_path = ctx.path("audio.wav");
        let mut extract_audio = Command::new("ffmpeg");
        extract_audio.args(["-y", "-i"]);
        extract_audio.arg(&video_path);
        extract_audio.args(["-vn", "-acodec", "pcm_s16le"]);
        extract_audio.arg(&audio_path);
        run_command(extract_audio).await?;

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
            .upload_file(&stage_key(&work.base_prefix, Stage::Mix, "video.mp4"), &video_path)
            .await?;
        let audio_url = ctx
            .upload_file(&stage_key(&work.base_prefix, Stage::Mix, "audio.wav"), &audio_path)
            .await?;
        let preview_url = ctx
            .upload_file(
                &stage_key(&work.base_prefix, Stage::Mix, "preview.m3u8"),
                &preview_path,
            )
            .await?;

        Ok(StageOutputs {
            video_key: Some(video_url),
            audio_key: Some(audio_url),
            preview_key: Some(preview_url),
            subs_key: None,
            report: Some(json!({"dubbed": work.expect_tts})),
        })
    }
}
