//! The orchestrator's four operations: handle job-created, handle stage
//! result, the job completion check, and envelope reconstruction (in
//! `crate::envelope`). Everything here is pure with respect to its
//! dependencies — [`Publisher`], [`ProgressSink`], and the `loc-db` repo
//! traits are all injected, so the six literal scenarios in the spec run
//! against fakes without a broker, database, or Redis.

use std::sync::Arc;

use loc_core::ResourceId;
use loc_core::domain::{JobOptions, JobStatus, VariantStatus};
use loc_core::envelope::{BusMessage, JobCreated, StageResult, YoutubeUpload};
use loc_core::pipeline::{self, Stage};
use loc_db::{AssetRepo, JobRepo, VariantUpdate, VoiceProfileRepo};
use loc_progress::ProgressEvent;
use tracing::{info, warn};

use crate::envelope::build_stage_work;
use crate::error::OrchestratorResult;
use crate::locks::JobLocks;
use crate::ports::{Publisher, ProgressSink};

pub struct Orchestrator {
    pub jobs: Arc<dyn JobRepo>,
    pub assets: Arc<dyn AssetRepo>,
    pub voice_profiles: Arc<dyn VoiceProfileRepo>,
    pub publisher: Arc<dyn Publisher>,
    pub progress: Arc<dyn ProgressSink>,
    pub locks: JobLocks,
}

fn job_level_event(job_id: ResourceId, status: &str) -> ProgressEvent {
    ProgressEvent {
        job_id,
        stage: "job".to_string(),
        lang: None,
        status: status.to_string(),
        progress: if status == "done" || status == "partial" || status == "error" {
            1.0
        } else {
            0.0
        },
        message: None,
        timestamp: chrono::Utc::now(),
    }
}

impl Orchestrator {
    /// Handle a `job.created` message: validate the source asset, resolve
    /// the voice profile, move the job to `processing`, and dispatch every
    /// variant's first non-skipped stage.
    pub async fn handle_job_created(&self, msg: &JobCreated) -> OrchestratorResult<()> {
        let _guard = self.locks.lock(msg.job_id).await;

        let (job, variants) = match self.jobs.fetch_job(msg.job_id).await {
            Ok(v) => v,
            Err(err) => {
                warn!(job_id = %msg.job_id, error = %err, "job-created for unknown job, dropping");
                return Ok(());
            }
        };

        if job.status != JobStatus::Queued {
            info!(job_id = %job.id, status = job.status.as_str(), "job-created redelivered after job already advanced, ignoring");
            return Ok(());
        }

        let asset = match self.assets.get_by_id(job.source_asset_id).await {
            Ok(asset) => asset,
            Err(_) => {
                self.jobs
                    .update_job_status(job.id, JobStatus::Error, Some("Source asset missing"))
                    .await?;
                self.progress
                    .publish(job_level_event(job.id, "error"))
                    .await;
                return Ok(());
            }
        };

        let voice_profile = match job.voice_profile_id {
            Some(id) => Some(self.voice_profiles.get_by_id(id).await?),
            None => None,
        };

        self.jobs
            .update_job_status(job.id, JobStatus::Processing, None)
            .await?;

        for variant in &variants {
            let first = pipeline::first_stage(&job.options);

            let updated = self
                .jobs
                .update_variant(
                    variant.id,
                    None,
                    VariantUpdate {
                        status: Some(VariantStatus::Processing),
                        current_stage: Some(Some(first)),
                        ..Default::default()
                    },
                )
                .await?;
            if !updated {
                // Already advanced by a redelivered job.created racing this one.
                continue;
            }

            self.progress
                .publish(ProgressEvent::new(job.id, first, "queued", Some(variant.lang.as_str())))
                .await;

            let work = build_stage_work(&job, &asset, voice_profile.as_ref(), variant, first);
            self.publisher
                .publish(&loc_bus::stage_work_key(first), &BusMessage::StageWork(work))
                .await?;

            info!(job_id = %job.id, variant_id = %variant.id, lang = %variant.lang, stage = first.as_str(), "dispatched first stage");
        }

        Ok(())
    }

    /// Handle a `stage.<name>.completed` or `stage.<name>.failed` message.
    pub async fn handle_stage_result(&self, result: &StageResult) -> OrchestratorResult<()> {
        let _guard = self.locks.lock(result.job_id).await;

        let variant = match self.jobs.fetch_variant(result.variant_id).await {
            Ok(v) => v,
            Err(err) => {
                warn!(variant_id = %result.variant_id, error = %err, "stage result for unknown variant, dropping");
                return Ok(());
            }
        };

        if variant.status.is_terminal() || variant.current_stage != Some(result.stage) {
            info!(
                job_id = %result.job_id,
                variant_id = %variant.id,
                stage = result.stage.as_str(),
                variant_status = variant.status.as_str(),
                current_stage = ?variant.current_stage,
                "stale or duplicate stage result, ignoring"
            );
            return Ok(());
        }

        if !result.ok {
            self.handle_stage_error(&variant, result).await?;
        } else {
            self.handle_stage_completed(&variant, result).await?;
        }

        self.job_completion_check(result.job_id).await
    }

    async fn handle_stage_error(
        &self,
        variant: &loc_core::domain::Variant,
        result: &StageResult,
    ) -> OrchestratorResult<()> {
        let updated = self
            .jobs
            .update_variant(
                variant.id,
                Some(result.stage),
                VariantUpdate {
                    status: Some(VariantStatus::Error),
                    current_stage: Some(None),
                    error_message: result.error_message.clone(),
                    ..Default::default()
                },
            )
            .await?;
        if !updated {
            return Ok(());
        }

        let mut event = ProgressEvent::new(result.job_id, result.stage, "error", Some(variant.lang.as_str()));
        event.message = result.error_message.clone();
        self.progress.publish(event).await;
        // First-observed-error signal at the job level; the job row's
        // terminal status is only finalized once every variant is
        // terminal (see job_completion_check).
        self.progress
            .publish(job_level_event(result.job_id, "error"))
            .await;

        warn!(
            job_id = %result.job_id,
            variant_id = %variant.id,
            lang = %variant.lang,
            stage = result.stage.as_str(),
            error = ?result.error_message,
            "variant stage failed"
        );
        Ok(())
    }

    async fn handle_stage_completed(
        &self,
        variant: &loc_core::domain::Variant,
        result: &StageResult,
    ) -> OrchestratorResult<()> {
        let job = self.jobs.fetch_job(result.job_id).await?.0;

        self.progress
            .publish(ProgressEvent::new(result.job_id, result.stage, "done", Some(variant.lang.as_str())).with_progress(1.0))
            .await;

        for skipped in pipeline::skipped_between(result.stage, &job.options) {
            self.progress
                .publish(ProgressEvent::new(result.job_id, skipped, "skipped", Some(variant.lang.as_str())).with_progress(1.0))
                .await;
        }

        // A stage only ever reports the artifacts it actually produced;
        // every other field stays `None` and the COALESCE update leaves
        // the corresponding column untouched.
        let artifacts = VariantUpdate {
            video_url: result.video_key.clone(),
            audio_url: result.audio_key.clone(),
            subs_url: result.subs_key.clone(),
            preview_url: result.preview_key.clone(),
            report: result.report.clone(),
            ..Default::default()
        };

        match pipeline::next_stage(result.stage, &job.options) {
            Some(next) => {
                let updated = self
                    .jobs
                    .update_variant(
                        variant.id,
                        Some(result.stage),
                        VariantUpdate {
                            current_stage: Some(Some(next)),
                            ..artifacts
                        },
                    )
                    .await?;
                if !updated {
                    return Ok(());
                }

                self.progress
                    .publish(ProgressEvent::new(result.job_id, next, "queued", Some(variant.lang.as_str())))
                    .await;

                let asset = self.assets.get_by_id(job.source_asset_id).await?;
                let voice_profile = match job.voice_profile_id {
                    Some(id) => Some(self.voice_profiles.get_by_id(id).await?),
                    None => None,
                };
                let work = build_stage_work(&job, &asset, voice_profile.as_ref(), variant, next);
                self.publisher
                    .publish(&loc_bus::stage_work_key(next), &BusMessage::StageWork(work))
                    .await?;

                info!(job_id = %job.id, variant_id = %variant.id, lang = %variant.lang, stage = next.as_str(), "dispatched next stage");
            }
            None => {
                let updated = self
                    .jobs
                    .update_variant(
                        variant.id,
                        Some(result.stage),
                        VariantUpdate {
                            status: Some(VariantStatus::Done),
                            current_stage: Some(None),
                            ..artifacts
                        },
                    )
                    .await?;
                if !updated {
                    return Ok(());
                }

                self.progress
                    .publish(ProgressEvent::new(result.job_id, Stage::Pack, "done", Some(variant.lang.as_str())).with_progress(1.0))
                    .await;

                info!(job_id = %job.id, variant_id = %variant.id, lang = %variant.lang, "variant reached pack, done");
            }
        }

        Ok(())
    }

    /// Re-evaluate the job's terminal status. Called after every stage
    /// result; a no-op while any variant is still active.
    pub async fn job_completion_check(&self, job_id: ResourceId) -> OrchestratorResult<()> {
        let (job, variants) = self.jobs.fetch_job(job_id).await?;
        if job.status.is_terminal() {
            return Ok(());
        }

        let any_active = variants
            .iter()
            .any(|v| matches!(v.status, VariantStatus::Queued | VariantStatus::Processing));
        if any_active {
            return Ok(());
        }

        let any_done = variants.iter().any(|v| v.status == VariantStatus::Done);
        let any_error = variants.iter().any(|v| v.status == VariantStatus::Error);

        if any_error && any_done {
            self.jobs
                .update_job_status(job.id, JobStatus::Partial, None)
                .await?;
            self.progress.publish(job_level_event(job.id, "partial")).await;
            info!(job_id = %job.id, "job finished partial");
        } else if any_error {
            let message = variants
                .iter()
                .find(|v| v.status == VariantStatus::Error)
                .and_then(|v| v.error_message.clone());
            self.jobs
                .update_job_status(job.id, JobStatus::Error, message.as_deref())
                .await?;
            self.progress.publish(job_level_event(job.id, "error")).await;
            info!(job_id = %job.id, "job finished error");
        } else {
            self.jobs
                .update_job_status(job.id, JobStatus::Done, None)
                .await?;
            self.progress.publish(job_level_event(job.id, "done")).await;
            info!(job_id = %job.id, "job finished done");
            self.dispatch_youtube_hook(&job, &variants).await?;
        }

        Ok(())
    }

    /// Fire one `youtube.upload` message per variant once a job with
    /// `upload_to_youtube = true` has reached `done`. Failures downstream
    /// of this publish never affect job status (spec's terminal-hook-only
    /// failure kind).
    async fn dispatch_youtube_hook(
        &self,
        job: &loc_core::domain::Job,
        variants: &[loc_core::domain::Variant],
    ) -> OrchestratorResult<()> {
        if !job.options.upload_to_youtube {
            return Ok(());
        }
        for variant in variants {
            let Some(video_url) = variant.video_url.clone() else {
                warn!(job_id = %job.id, variant_id = %variant.id, "done variant missing video_url, skipping youtube hook");
                continue;
            };
            let msg = YoutubeUpload {
                job_id: job.id,
                variant_id: variant.id,
                lang: variant.lang.clone(),
                video_url,
                subs_url: variant.subs_url.clone(),
            };
            self.publisher
                .publish(loc_bus::youtube_upload_key(), &BusMessage::YoutubeUpload(msg))
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use loc_core::domain::{Asset, AssetKind, Job, Variant, VoiceProfile};
    use loc_db::{DbError, DbResult};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex as AsyncMutex;

    struct FakeJobRepo {
        jobs: AsyncMutex<HashMap<ResourceId, Job>>,
        variants: AsyncMutex<HashMap<ResourceId, Variant>>,
    }

    #[async_trait]
    impl JobRepo for FakeJobRepo {
        async fn create_job_with_variants(
            &self,
            _project_id: ResourceId,
            _source_asset_id: ResourceId,
            _voice_profile_id: Option<ResourceId>,
            _languages: &[String],
            _options: JobOptions,
        ) -> DbResult<(Job, Vec<Variant>)> {
            unimplemented!("not exercised by orchestrator tests")
        }

        async fn fetch_job(&self, id: ResourceId) -> DbResult<(Job, Vec<Variant>)> {
            let jobs = self.jobs.lock().await;
            let job = jobs
                .get(&id)
                .cloned()
                .ok_or_else(|| DbError::NotFound(format!("job {id}")))?;
            let variants = self.variants.lock().await;
            let mut vs: Vec<Variant> = variants.values().filter(|v| v.job_id == id).cloned().collect();
            vs.sort_by(|a, b| a.lang.cmp(&b.lang));
            Ok((job, vs))
        }

        async fn fetch_variant(&self, id: ResourceId) -> DbResult<Variant> {
            let variants = self.variants.lock().await;
            variants
                .get(&id)
                .cloned()
                .ok_or_else(|| DbError::NotFound(format!("variant {id}")))
        }

        async fn update_job_status(
            &self,
            id: ResourceId,
            status: JobStatus,
            error_message: Option<&str>,
        ) -> DbResult<()> {
            let mut jobs = self.jobs.lock().await;
            let job = jobs.get_mut(&id).ok_or_else(|| DbError::NotFound(format!("job {id}")))?;
            job.status = status;
            if let Some(msg) = error_message {
                job.error_message = Some(msg.to_string());
            }
            Ok(())
        }

        async fn update_variant(
            &self,
            id: ResourceId,
            expected_current_stage: Option<Stage>,
            update: VariantUpdate,
        ) -> DbResult<bool> {
            let mut variants = self.variants.lock().await;
            let variant = variants.get_mut(&id).ok_or_else(|| DbError::NotFound(format!("variant {id}")))?;
            if variant.current_stage != expected_current_stage {
                return Ok(false);
            }
            if let Some(status) = update.status {
                variant.status = status;
            }
            if let Some(stage) = update.current_stage {
                variant.current_stage = stage;
            }
            if update.video_url.is_some() {
                variant.video_url = update.video_url;
            }
            if update.audio_url.is_some() {
                variant.audio_url = update.audio_url;
            }
            if update.subs_url.is_some() {
                variant.subs_url = update.subs_url;
            }
            if update.preview_url.is_some() {
                variant.preview_url = update.preview_url;
            }
            if update.report.is_some() {
                variant.report = update.report;
            }
            if update.error_message.is_some() {
                variant.error_message = update.error_message;
            }
            Ok(true)
        }
    }

    struct FakeAssetRepo {
        assets: HashMap<ResourceId, Asset>,
    }

    #[async_trait]
    impl AssetRepo for FakeAssetRepo {
        async fn create(&self, _project_id: ResourceId, _kind: AssetKind, _source_url: &str) -> DbResult<Asset> {
            unimplemented!()
        }
        async fn get_by_id(&self, id: ResourceId) -> DbResult<Asset> {
            self.assets.get(&id).cloned().ok_or_else(|| DbError::NotFound(format!("asset {id}")))
        }
    }

    struct FakeVoiceProfileRepo;

    #[async_trait]
    impl VoiceProfileRepo for FakeVoiceProfileRepo {
        async fn create(
            &self,
            _project_id: ResourceId,
            _name: &str,
            _provider: &str,
            _provider_params: serde_json::Value,
        ) -> DbResult<VoiceProfile> {
            unimplemented!()
        }
        async fn get_by_id(&self, id: ResourceId) -> DbResult<VoiceProfile> {
            Err(DbError::NotFound(format!("voice profile {id}")))
        }
    }

    struct FakePublisher {
        published: StdMutex<Vec<(String, BusMessage)>>,
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        async fn publish(&self, routing_key: &str, message: &BusMessage) -> OrchestratorResult<()> {
            self.published
                .lock()
                .unwrap()
                .push((routing_key.to_string(), message.clone()));
            Ok(())
        }
    }

    struct FakeProgress {
        events: StdMutex<Vec<ProgressEvent>>,
    }

    #[async_trait]
    impl ProgressSink for FakeProgress {
        async fn publish(&self, event: ProgressEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn variant(job_id: ResourceId, lang: &str) -> Variant {
        Variant {
            id: ResourceId::new(),
            job_id,
            lang: lang.to_string(),
            status: VariantStatus::Queued,
            current_stage: None,
            video_url: None,
            audio_url: None,
            subs_url: None,
            preview_url: None,
            report: None,
            error_message: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn job(project_id: ResourceId, source_asset_id: ResourceId, languages: Vec<&str>, options: JobOptions) -> Job {
        Job {
            id: ResourceId::new(),
            project_id,
            source_asset_id,
            voice_profile_id: None,
            languages: languages.into_iter().map(String::from).collect(),
            options,
            status: JobStatus::Queued,
            error_message: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    struct Harness {
        orchestrator: Orchestrator,
        jobs: Arc<FakeJobRepo>,
        publisher: Arc<FakePublisher>,
        progress: Arc<FakeProgress>,
    }

    fn build_harness(job: Job, variants: Vec<Variant>, asset: Asset) -> Harness {
        let mut jobs_map = HashMap::new();
        jobs_map.insert(job.id, job);
        let mut variants_map = HashMap::new();
        for v in variants {
            variants_map.insert(v.id, v);
        }
        let jobs = Arc::new(FakeJobRepo {
            jobs: AsyncMutex::new(jobs_map),
            variants: AsyncMutex::new(variants_map),
        });
        let mut assets_map = HashMap::new();
        assets_map.insert(asset.id, asset);
        let assets = Arc::new(FakeAssetRepo { assets: assets_map });
        let publisher = Arc::new(FakePublisher {
            published: StdMutex::new(Vec::new()),
        });
        let progress = Arc::new(FakeProgress {
            events: StdMutex::new(Vec::new()),
        });
        let orchestrator = Orchestrator {
            jobs: jobs.clone(),
            assets,
            voice_profiles: Arc::new(FakeVoiceProfileRepo),
            publisher: publisher.clone(),
            progress: progress.clone(),
            locks: JobLocks::new(),
        };
        Harness {
            orchestrator,
            jobs,
            publisher,
            progress,
        }
    }

    fn asset_for(project_id: ResourceId) -> Asset {
        Asset {
            id: ResourceId::new(),
            project_id,
            kind: AssetKind::Video,
            source_url: "s3://bucket/source.mp4".into(),
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn job_created_dispatches_asr_for_every_variant() {
        let project_id = ResourceId::new();
        let asset = asset_for(project_id);
        let mut j = job(project_id, asset.id, vec!["de", "fr"], JobOptions::default());
        j.source_asset_id = asset.id;
        let v_de = variant(j.id, "de");
        let v_fr = variant(j.id, "fr");
        let h = build_harness(j.clone(), vec![v_de, v_fr], asset);

        h.orchestrator
            .handle_job_created(&JobCreated {
                job_id: j.id,
                project_id,
                source_asset_id: j.source_asset_id,
                voice_profile_id: None,
                languages: vec!["de".into(), "fr".into()],
                options: j.options,
            })
            .await
            .unwrap();

        let (reloaded, variants) = h.jobs.fetch_job(j.id).await.unwrap();
        assert_eq!(reloaded.status, JobStatus::Processing);
        assert!(variants.iter().all(|v| v.current_stage == Some(Stage::Asr)));
        assert_eq!(h.publisher.published.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn asset_missing_sets_job_error_and_publishes_nothing() {
        let project_id = ResourceId::new();
        let missing_asset_id = ResourceId::new();
        let j = job(project_id, missing_asset_id, vec!["de"], JobOptions::default());
        let v = variant(j.id, "de");
        let asset = asset_for(project_id); // different id than job.source_asset_id
        let h = build_harness(j.clone(), vec![v], asset);

        h.orchestrator
            .handle_job_created(&JobCreated {
                job_id: j.id,
                project_id,
                source_asset_id: missing_asset_id,
                voice_profile_id: None,
                languages: vec!["de".into()],
                options: j.options,
            })
            .await
            .unwrap();

        let (reloaded, _) = h.jobs.fetch_job(j.id).await.unwrap();
        assert_eq!(reloaded.status, JobStatus::Error);
        assert_eq!(reloaded.error_message.as_deref(), Some("Source asset missing"));
        assert!(h.publisher.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn subtitles_only_job_skips_tts_and_textinframe() {
        let project_id = ResourceId::new();
        let asset = asset_for(project_id);
        let options = JobOptions {
            dub: false,
            subs: true,
            replace_text_in_frame: false,
            upload_to_youtube: false,
        };
        let j = job(project_id, asset.id, vec!["fr"], options);
        let v = variant(j.id, "fr");
        let variant_id = v.id;
        let h = build_harness(j.clone(), vec![v], asset);

        h.orchestrator
            .handle_job_created(&JobCreated {
                job_id: j.id,
                project_id,
                source_asset_id: j.source_asset_id,
                voice_profile_id: None,
                languages: vec!["fr".into()],
                options,
            })
            .await
            .unwrap();

        for stage in [Stage::Asr, Stage::Translate] {
            h.orchestrator
                .handle_stage_result(&StageResult {
                    job_id: j.id,
                    variant_id,
                    lang: "fr".into(),
                    stage,
                    ok: true,
                    error_message: None,
                    video_key: None,
                    audio_key: None,
                    subs_key: None,
                    preview_key: None,
                    report: None,
                })
                .await
                .unwrap();
        }

        let (_, variants) = h.jobs.fetch_job(j.id).await.unwrap();
        // translate -> mix (tts skipped)
        assert_eq!(variants[0].current_stage, Some(Stage::Mix));

        let events = h.progress.events.lock().unwrap();
        assert!(events.iter().any(|e| e.stage == "tts" && e.status == "skipped"));
    }

    #[tokio::test]
    async fn duplicate_completion_is_a_no_op() {
        let project_id = ResourceId::new();
        let asset = asset_for(project_id);
        let j = job(project_id, asset.id, vec!["fr"], JobOptions::default());
        let mut v = variant(j.id, "fr");
        v.status = VariantStatus::Processing;
        v.current_stage = Some(Stage::Asr);
        let variant_id = v.id;
        let h = build_harness(j.clone(), vec![v], asset);

        let result = StageResult {
            job_id: j.id,
            variant_id,
            lang: "fr".into(),
            stage: Stage::Asr,
            ok: true,
            error_message: None,
            video_key: None,
            audio_key: None,
            subs_key: None,
            preview_key: None,
            report: None,
        };

        h.orchestrator.handle_stage_result(&result).await.unwrap();
        h.orchestrator.handle_stage_result(&result).await.unwrap();

        let (_, variants) = h.jobs.fetch_job(j.id).await.unwrap();
        assert_eq!(variants[0].current_stage, Some(Stage::Translate));
        // Only one publish for stage.translate should have occurred.
        let published = h.publisher.published.lock().unwrap();
        let translate_dispatches = published
            .iter()
            .filter(|(key, _)| key == "stage.translate")
            .count();
        assert_eq!(translate_dispatches, 1);
    }

    #[tokio::test]
    async fn partial_failure_yields_partial_job_status() {
        let project_id = ResourceId::new();
        let asset = asset_for(project_id);
        let j = job(project_id, asset.id, vec!["de", "fr"], JobOptions::default());
        let mut v_de = variant(j.id, "de");
        v_de.status = VariantStatus::Done;
        v_de.current_stage = None;
        let mut v_fr = variant(j.id, "fr");
        v_fr.status = VariantStatus::Processing;
        v_fr.current_stage = Some(Stage::Tts);
        let fr_id = v_fr.id;
        let mut j = j;
        j.status = JobStatus::Processing;
        let h = build_harness(j.clone(), vec![v_de, v_fr], asset);

        h.orchestrator
            .handle_stage_result(&StageResult {
                job_id: j.id,
                variant_id: fr_id,
                lang: "fr".into(),
                stage: Stage::Tts,
                ok: false,
                error_message: Some("tts provider timeout".into()),
                video_key: None,
                audio_key: None,
                subs_key: None,
                preview_key: None,
                report: None,
            })
            .await
            .unwrap();

        let (reloaded, variants) = h.jobs.fetch_job(j.id).await.unwrap();
        assert_eq!(reloaded.status, JobStatus::Partial);
        let fr = variants.iter().find(|v| v.lang == "fr").unwrap();
        assert_eq!(fr.status, VariantStatus::Error);
        assert_eq!(fr.error_message.as_deref(), Some("tts provider timeout"));
    }

    #[tokio::test]
    async fn youtube_hook_fires_once_per_variant_only_on_full_success() {
        let project_id = ResourceId::new();
        let asset = asset_for(project_id);
        let options = JobOptions {
            dub: true,
            subs: true,
            replace_text_in_frame: false,
            upload_to_youtube: true,
        };
        let j = job(project_id, asset.id, vec!["de", "fr"], options);
        let mut v_de = variant(j.id, "de");
        v_de.status = VariantStatus::Processing;
        v_de.current_stage = Some(Stage::Qc);
        v_de.video_url = Some("s3://bucket/jobs/x/de/mix/out.mp4".into());
        let de_id = v_de.id;
        let mut v_fr = variant(j.id, "fr");
        v_fr.status = VariantStatus::Done;
        v_fr.current_stage = None;
        v_fr.video_url = Some("s3://bucket/jobs/x/fr/mix/out.mp4".into());
        let mut j = j;
        j.status = JobStatus::Processing;
        let h = build_harness(j.clone(), vec![v_de, v_fr], asset);

        h.orchestrator
            .handle_stage_result(&StageResult {
                job_id: j.id,
                variant_id: de_id,
                lang: "de".into(),
                stage: Stage::Qc,
                ok: true,
                error_message: None,
                video_key: None,
                audio_key: None,
                subs_key: None,
                preview_key: None,
                report: None,
            })
            .await
            .unwrap();

        let (reloaded, _) = h.jobs.fetch_job(j.id).await.unwrap();
        assert_eq!(reloaded.status, JobStatus::Done);

        let published = h.publisher.published.lock().unwrap();
        let uploads = published
            .iter()
            .filter(|(key, _)| key == "youtube.upload")
            .count();
        assert_eq!(uploads, 2);
    }
}
