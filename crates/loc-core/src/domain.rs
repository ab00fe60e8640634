//! The job/variant/asset/voice-profile domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ResourceId;
use crate::pipeline::Stage;

/// Per-job feature toggles. These never change after job creation — the
/// orchestrator reads them once per job and reuses them for every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOptions {
    /// Run `tts` + `mix` with a synthesized voice track. If false, `mix`
    /// still runs but passes the source audio through unchanged.
    #[serde(default = "default_true")]
    pub dub: bool,
    /// Render and attach subtitle tracks.
    #[serde(default = "default_true")]
    pub subs: bool,
    /// Burn localized text into frame via `textinframe`.
    #[serde(default)]
    pub replace_text_in_frame: bool,
    /// Fire the post-pipeline YouTube upload hook once the job is `done`.
    #[serde(default)]
    pub upload_to_youtube: bool,
}

fn default_true() -> bool {
    true
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            dub: true,
            subs: true,
            replace_text_in_frame: false,
            upload_to_youtube: false,
        }
    }
}

/// Overall job status. Transitions are forward-only:
/// `queued -> processing -> (done | error | partial)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Done,
    Error,
    Partial,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Partial)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
            JobStatus::Partial => "partial",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "processing" => Ok(JobStatus::Processing),
            "done" => Ok(JobStatus::Done),
            "error" => Ok(JobStatus::Error),
            "partial" => Ok(JobStatus::Partial),
            other => Err(crate::Error::Internal(format!(
                "unknown job status: {other}"
            ))),
        }
    }
}

/// Per-variant status. Forward-only: `queued -> processing -> (done | error)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantStatus {
    Queued,
    Processing,
    Done,
    Error,
}

impl VariantStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, VariantStatus::Done | VariantStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VariantStatus::Queued => "queued",
            VariantStatus::Processing => "processing",
            VariantStatus::Done => "done",
            VariantStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for VariantStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(VariantStatus::Queued),
            "processing" => Ok(VariantStatus::Processing),
            "done" => Ok(VariantStatus::Done),
            "error" => Ok(VariantStatus::Error),
            other => Err(crate::Error::Internal(format!(
                "unknown variant status: {other}"
            ))),
        }
    }
}

/// The kind of media an `Asset` refers to. Only `video` is processed by the
/// pipeline today; other kinds are accepted for forward-compatibility with
/// the out-of-scope asset catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Video,
    Audio,
    Image,
}

/// A source asset the orchestrator reads once per job, to resolve the
/// `source_url` handed to the first stage's envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: ResourceId,
    pub project_id: ResourceId,
    pub kind: AssetKind,
    /// `s3://bucket/key` location of the source media.
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

/// Opaque provider parameters for a TTS voice, resolved once per job and
/// threaded unmodified through every `tts` stage envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceProfile {
    pub id: ResourceId,
    pub project_id: ResourceId,
    pub name: String,
    pub provider: String,
    pub provider_params: serde_json::Value,
}

/// A localization job: one source asset fanned out into a fixed set of
/// target-language variants. `languages` and `options` are frozen at
/// creation time — the orchestrator never reads them from anywhere other
/// than the row it loaded when the job was created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: ResourceId,
    pub project_id: ResourceId,
    pub source_asset_id: ResourceId,
    pub voice_profile_id: Option<ResourceId>,
    pub languages: Vec<String>,
    pub options: JobOptions,
    pub status: JobStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One target-language branch of a job. `current_stage` is `None` once the
/// variant reaches a terminal status; while `processing` it names the
/// stage that was last dispatched, used to guard against acting twice on a
/// redelivered completion for a stage the variant has already moved past.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: ResourceId,
    pub job_id: ResourceId,
    pub lang: String,
    pub status: VariantStatus,
    pub current_stage: Option<Stage>,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub subs_url: Option<String>,
    pub preview_url: Option<String>,
    pub report: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variant {
    /// `jobs/<job_id>/<lang>` — the root every stage's output keys nest under.
    pub fn base_prefix(&self) -> String {
        format!("jobs/{}/{}", self.job_id, self.lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_round_trips_through_str() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::Done,
            JobStatus::Error,
            JobStatus::Partial,
        ] {
            let parsed: JobStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn variant_status_round_trips_through_str() {
        for status in [
            VariantStatus::Queued,
            VariantStatus::Processing,
            VariantStatus::Done,
            VariantStatus::Error,
        ] {
            let parsed: VariantStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn only_done_error_partial_are_terminal_job_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Partial.is_terminal());
    }

    #[test]
    fn default_options_enable_dub_and_subs_only() {
        let options = JobOptions::default();
        assert!(options.dub);
        assert!(options.subs);
        assert!(!options.replace_text_in_frame);
        assert!(!options.upload_to_youtube);
    }
}
