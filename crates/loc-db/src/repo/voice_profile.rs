//! Voice profile repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loc_core::ResourceId;
use loc_core::domain::VoiceProfile;
use sqlx::PgPool;

use crate::{DbError, DbResult};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoiceProfileRow {
    pub id: uuid::Uuid,
    pub project_id: uuid::Uuid,
    pub name: String,
    pub provider: String,
    pub provider_params: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl VoiceProfileRow {
    pub fn into_domain(self) -> VoiceProfile {
        VoiceProfile {
            id: ResourceId::from_uuid(self.id),
            project_id: ResourceId::from_uuid(self.project_id),
            name: self.name,
            provider: self.provider,
            provider_params: self.provider_params,
        }
    }
}

#[async_trait]
pub trait VoiceProfileRepo: Send + Sync {
    async fn create(
        &self,
        project_id: ResourceId,
        name: &str,
        provider: &str,
        provider_params: serde_json::Value,
    ) -> DbResult<VoiceProfile>;
    async fn get_by_id(&self, id: ResourceId) -> DbResult<VoiceProfile>;
}

pub struct PgVoiceProfileRepo {
    pool: PgPool,
}

impl PgVoiceProfileRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VoiceProfileRepo for PgVoiceProfileRepo {
    async fn create(
        &self,
        project_id: ResourceId,
        name: &str,
        provider: &str,
        provider_params: serde_json::Value,
    ) -> DbResult<VoiceProfile> {
        let row = sqlx::query_as::<_, VoiceProfileRow>(
            r#"
            INSERT INTO voice_profile (id, project_id, name, provider, provider_params, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(project_id.as_uuid())
        .bind(name)
        .bind(provider)
        .bind(provider_params)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into_domain())
    }

    async fn get_by_id(&self, id: ResourceId) -> DbResult<VoiceProfile> {
        let row = sqlx::query_as::<_, VoiceProfileRow>("SELECT * FROM voice_profile WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("voice profile {id}")))?;
        Ok(row.into_domain())
    }
}
