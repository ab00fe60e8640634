//! Job and variant repository.
//!
//! A job and its variants are written together on creation, then the
//! orchestrator drives each variant's `status`/`current_stage`/output
//! columns forward one stage result at a time. `current_stage` guards
//! against acting twice on a redelivered or out-of-order stage completion:
//! the orchestrator compares an incoming `StageResult.stage` against the
//! variant's persisted `current_stage` before moving it forward.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loc_core::ResourceId;
use loc_core::domain::{Job, JobOptions, JobStatus, Variant, VariantStatus};
use loc_core::pipeline::Stage;
use sqlx::PgPool;

use crate::{DbError, DbResult};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: uuid::Uuid,
    pub project_id: uuid::Uuid,
    pub source_asset_id: uuid::Uuid,
    pub voice_profile_id: Option<uuid::Uuid>,
    pub languages: serde_json::Value,
    pub options: serde_json::Value,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRow {
    pub fn into_domain(self) -> DbResult<Job> {
        let languages: Vec<String> = serde_json::from_value(self.languages)
            .map_err(|e| DbError::Invalid(format!("job languages: {e}")))?;
        let options: JobOptions = serde_json::from_value(self.options)
            .map_err(|e| DbError::Invalid(format!("job options: {e}")))?;
        let status: JobStatus = self
            .status
            .parse()
            .map_err(|e| DbError::Invalid(format!("job status: {e}")))?;
        Ok(Job {
            id: ResourceId::from_uuid(self.id),
            project_id: ResourceId::from_uuid(self.project_id),
            source_asset_id: ResourceId::from_uuid(self.source_asset_id),
            voice_profile_id: self.voice_profile_id.map(ResourceId::from_uuid),
            languages,
            options,
            status,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: uuid::Uuid,
    pub job_id: uuid::Uuid,
    pub lang: String,
    pub status: String,
    pub current_stage: Option<String>,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub subs_url: Option<String>,
    pub preview_url: Option<String>,
    pub report: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VariantRow {
    pub fn into_domain(self) -> DbResult<Variant> {
        let status: VariantStatus = self
            .status
            .parse()
            .map_err(|e| DbError::Invalid(format!("variant status: {e}")))?;
        let current_stage = match self.current_stage {
            Some(s) => Some(
                Stage::from_str_opt(&s)
                    .ok_or_else(|| DbError::Invalid(format!("unknown stage: {s}")))?,
            ),
            None => None,
        };
        Ok(Variant {
            id: ResourceId::from_uuid(self.id),
            job_id: ResourceId::from_uuid(self.job_id),
            lang: self.lang,
            status,
            current_stage,
            video_url: self.video_url,
            audio_url: self.audio_url,
            subs_url: self.subs_url,
            preview_url: self.preview_url,
            report: self.report,
            error_message: self.error_message,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Fields the orchestrator writes back after handling a stage result.
/// `None` means "leave the column unchanged" (mirrors the original
/// service's `COALESCE($n, column)` update).
#[derive(Debug, Clone, Default)]
pub struct VariantUpdate {
    pub status: Option<VariantStatus>,
    pub current_stage: Option<Option<Stage>>,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub subs_url: Option<String>,
    pub preview_url: Option<String>,
    pub report: Option<serde_json::Value>,
    pub error_message: Option<String>,
}

#[async_trait]
pub trait JobRepo: Send + Sync {
    /// Insert a job and one variant per language, all in one transaction.
    async fn create_job_with_variants(
        &self,
        project_id: ResourceId,
        source_asset_id: ResourceId,
        voice_profile_id: Option<ResourceId>,
        languages: &[String],
        options: JobOptions,
    ) -> DbResult<(Job, Vec<Variant>)>;

    /// The job plus every one of its variants, ordered by `lang`.
    async fn fetch_job(&self, id: ResourceId) -> DbResult<(Job, Vec<Variant>)>;

    async fn fetch_variant(&self, id: ResourceId) -> DbResult<Variant>;

    async fn update_job_status(
        &self,
        id: ResourceId,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> DbResult<()>;

    /// Apply a partial update to a variant's columns, using
    /// `current_stage` as a monotonic guard: the update is skipped
    /// entirely (not an error) if `expected_current_stage` no longer
    /// matches the persisted value, since that means a later stage result
    /// already moved the variant past it.
    async fn update_variant(
        &self,
        id: ResourceId,
        expected_current_stage: Option<Stage>,
        update: VariantUpdate,
    ) -> DbResult<bool>;
}

pub struct PgJobRepo {
    pool: PgPool,
}

impl PgJobRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepo for PgJobRepo {
    async fn create_job_with_variants(
        &self,
        project_id: ResourceId,
        source_asset_id: ResourceId,
        voice_profile_id: Option<ResourceId>,
        languages: &[String],
        options: JobOptions,
    ) -> DbResult<(Job, Vec<Variant>)> {
        let mut tx = self.pool.begin().await?;

        let languages_json = serde_json::to_value(languages)
            .map_err(|e| DbError::Invalid(format!("languages: {e}")))?;
        let options_json =
            serde_json::to_value(options).map_err(|e| DbError::Invalid(format!("options: {e}")))?;

        let job_row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO localization_job
                (id, project_id, source_asset_id, voice_profile_id, languages, options, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 'queued', NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(project_id.as_uuid())
        .bind(source_asset_id.as_uuid())
        .bind(voice_profile_id.map(|id| *id.as_uuid()))
        .bind(languages_json)
        .bind(options_json)
        .fetch_one(&mut *tx)
        .await?;

        let mut variant_rows = Vec::with_capacity(languages.len());
        for lang in languages {
            let row = sqlx::query_as::<_, VariantRow>(
                r#"
                INSERT INTO localized_variant (id, job_id, lang, status, created_at, updated_at)
                VALUES ($1, $2, $3, 'queued', NOW(), NOW())
                RETURNING *
                "#,
            )
            .bind(uuid::Uuid::now_v7())
            .bind(job_row.id)
            .bind(lang)
            .fetch_one(&mut *tx)
            .await?;
            variant_rows.push(row);
        }

        tx.commit().await?;

        let job = job_row.into_domain()?;
        let variants = variant_rows
            .into_iter()
            .map(VariantRow::into_domain)
            .collect::<DbResult<Vec<_>>>()?;
        Ok((job, variants))
    }

    async fn fetch_job(&self, id: ResourceId) -> DbResult<(Job, Vec<Variant>)> {
        let job_row = sqlx::query_as::<_, JobRow>("SELECT * FROM localization_job WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("job {id}")))?;

        let variant_rows = sqlx::query_as::<_, VariantRow>(
            "SELECT * FROM localized_variant WHERE job_id = $1 ORDER BY lang",
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let job = job_row.into_domain()?;
        let variants = variant_rows
            .into_iter()
            .map(VariantRow::into_domain)
            .collect::<DbResult<Vec<_>>>()?;
        Ok((job, variants))
    }

    async fn fetch_variant(&self, id: ResourceId) -> DbResult<Variant> {
        let row = sqlx::query_as::<_, VariantRow>("SELECT * FROM localized_variant WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("variant {id}")))?;
        row.into_domain()
    }

    async fn update_job_status(
        &self,
        id: ResourceId,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE localization_job
            SET status = $2, error_message = COALESCE($3, error_message), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(error_message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_variant(
        &self,
        id: ResourceId,
        expected_current_stage: Option<Stage>,
        update: VariantUpdate,
    ) -> DbResult<bool> {
        let expected = expected_current_stage.map(Stage::as_str);
        let next_stage = update.current_stage.map(|s| s.map(Stage::as_str));

        let result = sqlx::query(
            r#"
            UPDATE localized_variant
            SET
                status = COALESCE($3, status),
                current_stage = CASE WHEN $4 THEN $5 ELSE current_stage END,
                video_url = COALESCE($6, video_url),
                audio_url = COALESCE($7, audio_url),
                subs_url = COALESCE($8, subs_url),
                preview_url = COALESCE($9, preview_url),
                report = COALESCE($10::jsonb, report),
                error_message = COALESCE($11, error_message),
                updated_at = NOW()
            WHERE id = $1
              AND current_stage IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected)
        .bind(update.status.map(VariantStatus::as_str))
        .bind(next_stage.is_some())
        .bind(next_stage.flatten())
        .bind(update.video_url)
        .bind(update.audio_url)
        .bind(update.subs_url)
        .bind(update.preview_url)
        .bind(update.report)
        .bind(update.error_message)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
