//! Stage envelope reconstruction.
//!
//! Every dispatch rebuilds the envelope from persisted rows instead of
//! threading it along the chain of stage results — a replayed dispatch is
//! always identical, and a job option corrected between stages (rare, but
//! permitted) takes effect on the very next stage.

use loc_core::domain::{Asset, Job, Variant, VoiceProfile};
use loc_core::envelope::StageWork;
use loc_core::pipeline::{Stage, should_skip};

pub fn build_stage_work(
    job: &Job,
    asset: &Asset,
    voice_profile: Option<&VoiceProfile>,
    variant: &Variant,
    stage: Stage,
) -> StageWork {
    StageWork {
        job_id: job.id,
        project_id: job.project_id,
        variant_id: variant.id,
        lang: variant.lang.clone(),
        stage,
        source_url: asset.source_url.clone(),
        options: job.options,
        base_prefix: variant.base_prefix(),
        expect_tts: !should_skip(Stage::Tts, &job.options),
        voice_profile: voice_profile.cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loc_core::ResourceId;
    use loc_core::domain::{AssetKind, JobOptions, JobStatus, VariantStatus};
    use chrono::Utc;

    fn job(options: JobOptions) -> Job {
        Job {
            id: ResourceId::new(),
            project_id: ResourceId::new(),
            source_asset_id: ResourceId::new(),
            voice_profile_id: None,
            languages: vec!["fr".into()],
            options,
            status: JobStatus::Processing,
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn asset(project_id: ResourceId) -> Asset {
        Asset {
            id: ResourceId::new(),
            project_id,
            kind: AssetKind::Video,
            source_url: "s3://bucket/source.mp4".into(),
            created_at: Utc::now(),
        }
    }

    fn variant(job_id: ResourceId) -> Variant {
        Variant {
            id: ResourceId::new(),
            job_id,
            lang: "fr".into(),
            status: VariantStatus::Processing,
            current_stage: Some(Stage::Asr),
            video_url: None,
            audio_url: None,
            subs_url: None,
            preview_url: None,
            report: None,
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn base_prefix_nests_under_job_and_lang() {
        let j = job(JobOptions::default());
        let a = asset(j.project_id);
        let v = variant(j.id);
        let work = build_stage_work(&j, &a, None, &v, Stage::Translate);
        assert_eq!(work.base_prefix, format!("jobs/{}/fr", j.id));
        assert_eq!(work.source_url, "s3://bucket/source.mp4");
    }

    #[test]
    fn expect_tts_mirrors_dub_option() {
        let mut options = JobOptions::default();
        options.dub = false;
        let j = job(options);
        let a = asset(j.project_id);
        let v = variant(j.id);
        let work = build_stage_work(&j, &a, None, &v, Stage::Mix);
        assert!(!work.expect_tts);
    }
}
