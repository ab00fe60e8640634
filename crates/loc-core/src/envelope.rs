//! The wire contract between the API, the orchestrator, and stage workers.
//!
//! Every message on the bus is one variant of [`BusMessage`], tagged by
//! `type` in its JSON form. This replaces the original services' untyped
//! dict payloads (spec's "dynamic dict payloads on the wire" redesign
//! note) with one concrete Rust type per message family.

use serde::{Deserialize, Serialize};

use crate::domain::JobOptions;
use crate::id::ResourceId;
use crate::pipeline::Stage;

/// Published to `job.created` by the API once a job and its variants have
/// been persisted. Consumed by the orchestrator to kick off the first
/// stage of every variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreated {
    pub job_id: ResourceId,
    pub project_id: ResourceId,
    pub source_asset_id: ResourceId,
    pub voice_profile_id: Option<ResourceId>,
    pub languages: Vec<String>,
    pub options: JobOptions,
}

/// Published by the orchestrator to `stage.<stage>`, consumed by exactly
/// one worker of the matching kind. Reconstructed from persisted state on
/// every dispatch, never cached in memory, so a worker crash and restart
/// never loses an in-flight unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageWork {
    pub job_id: ResourceId,
    pub project_id: ResourceId,
    pub variant_id: ResourceId,
    pub lang: String,
    pub stage: Stage,
    /// `s3://bucket/key` of the job's original source asset. Every stage
    /// after `asr` locates its own upstream input deterministically under
    /// `base_prefix` (e.g. `translate` always reads
    /// `<base_prefix>/asr/segments.json`) rather than being told an exact
    /// key, so this field only varies across jobs, never across stages.
    pub source_url: String,
    pub options: JobOptions,
    /// `jobs/<job_id>/<lang>` — every output key this stage writes nests
    /// under this prefix.
    pub base_prefix: String,
    /// Whether a `tts` output exists for this variant. `mix` reads this to
    /// decide between muxing a synthesized track or passing audio through.
    pub expect_tts: bool,
    pub voice_profile: Option<crate::domain::VoiceProfile>,
}

/// Published by a worker to `stage.<stage>.completed` or
/// `stage.<stage>.failed` once a unit of work finishes. The orchestrator
/// reconciles this against the variant's persisted `current_stage` before
/// acting, so a redelivered or late completion for a stage the variant has
/// already moved past is a documented no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub job_id: ResourceId,
    pub variant_id: ResourceId,
    pub lang: String,
    pub stage: Stage,
    pub ok: bool,
    pub error_message: Option<String>,
    pub video_key: Option<String>,
    pub audio_key: Option<String>,
    pub subs_key: Option<String>,
    pub preview_key: Option<String>,
    pub report: Option<serde_json::Value>,
}

/// Published by the orchestrator to `youtube.upload` once a variant's job
/// has reached `done` and the job has `upload_to_youtube` set. The
/// uploader never touches the database; a failure here is logged only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YoutubeUpload {
    pub job_id: ResourceId,
    pub variant_id: ResourceId,
    pub lang: String,
    pub video_url: String,
    pub subs_url: Option<String>,
}

/// Every message family that can appear on the bus, tagged by `type` in
/// JSON so a consumer can deserialize without knowing in advance which
/// variant it received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMessage {
    JobCreated(JobCreated),
    StageWork(StageWork),
    StageResult(StageResult),
    YoutubeUpload(YoutubeUpload),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_created_round_trips_with_type_tag() {
        let msg = BusMessage::JobCreated(JobCreated {
            job_id: ResourceId::new(),
            project_id: ResourceId::new(),
            source_asset_id: ResourceId::new(),
            voice_profile_id: None,
            languages: vec!["fr".into(), "de".into()],
            options: JobOptions::default(),
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "job_created");
        let back: BusMessage = serde_json::from_value(json).unwrap();
        match back {
            BusMessage::JobCreated(jc) => assert_eq!(jc.languages, vec!["fr", "de"]),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn stage_result_round_trips_with_optional_outputs_absent() {
        let msg = BusMessage::StageResult(StageResult {
            job_id: ResourceId::new(),
            variant_id: ResourceId::new(),
            lang: "fr".into(),
            stage: Stage::Asr,
            ok: true,
            error_message: None,
            video_key: None,
            audio_key: None,
            subs_key: None,
            preview_key: None,
            report: None,
        });
        let json = serde_json::to_string(&msg).unwrap();
        let back: BusMessage = serde_json::from_str(&json).unwrap();
        match back {
            BusMessage::StageResult(r) => {
                assert!(r.ok);
                assert!(r.video_key.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
