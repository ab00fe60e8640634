//! Project repository.
//!
//! Projects are the ownership root for assets, voice profiles, and jobs.
//! Everything beyond `owner_id` (users, organizations, billing) is out of
//! scope here; this repo exists so jobs and assets have somewhere to point.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loc_core::ResourceId;
use sqlx::PgPool;

use crate::{DbError, DbResult};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: uuid::Uuid,
    pub name: String,
    pub owner_id: uuid::Uuid,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait ProjectRepo: Send + Sync {
    async fn create(&self, name: &str, owner_id: ResourceId) -> DbResult<ProjectRow>;
    async fn get_by_id(&self, id: ResourceId) -> DbResult<ProjectRow>;
}

pub struct PgProjectRepo {
    pool: PgPool,
}

impl PgProjectRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepo for PgProjectRepo {
    async fn create(&self, name: &str, owner_id: ResourceId) -> DbResult<ProjectRow> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            INSERT INTO project (id, name, owner_id, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING *
            "#,
        )
        .bind(uuid::Uuid::now_v7())
        .bind(name)
        .bind(owner_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_by_id(&self, id: ResourceId) -> DbResult<ProjectRow> {
        let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM project WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("project {id}")))?;
        Ok(row)
    }
}
