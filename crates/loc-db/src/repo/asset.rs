//! Asset repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loc_core::ResourceId;
use loc_core::domain::{Asset, AssetKind};
use sqlx::PgPool;

use crate::{DbError, DbResult};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssetRow {
    pub id: uuid::Uuid,
    pub project_id: uuid::Uuid,
    pub kind: String,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

impl AssetRow {
    pub fn into_domain(self) -> DbResult<Asset> {
        let kind = match self.kind.as_str() {
            "video" => AssetKind::Video,
            "audio" => AssetKind::Audio,
            "image" => AssetKind::Image,
            other => return Err(DbError::Invalid(format!("unknown asset kind: {other}"))),
        };
        Ok(Asset {
            id: ResourceId::from_uuid(self.id),
            project_id: ResourceId::from_uuid(self.project_id),
            kind,
            source_url: self.source_url,
            created_at: self.created_at,
        })
    }
}

#[async_trait]
pub trait AssetRepo: Send + Sync {
    async fn create(
        &self,
        project_id: ResourceId,
        kind: AssetKind,
        source_url: &str,
    ) -> DbResult<Asset>;
    async fn get_by_id(&self, id: ResourceId) -> DbResult<Asset>;
}

pub struct PgAssetRepo {
    pool: PgPool,
}

impl PgAssetRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn kind_str(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Video => "video",
        AssetKind::Audio => "audio",
        AssetKind::Image => "image",
    }
}

#[async_trait]
impl AssetRepo for PgAssetRepo {
    async fn create(
        &self,
        project_id: ResourceId,
        kind: AssetKind,
        source_url: &str,
    ) -> DbResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>(
            r#"
            INSERT INTO asset (id, project_id, kind, source_url, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(project_id.as_uuid())
        .bind(kind_str(kind))
        .bind(source_url)
        .fetch_one(&self.pool)
        .await?;
        row.into_domain()
    }

    async fn get_by_id(&self, id: ResourceId) -> DbResult<Asset> {
        let row = sqlx::query_as::<_, AssetRow>("SELECT * FROM asset WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("asset {id}")))?;
        row.into_domain()
    }
}
