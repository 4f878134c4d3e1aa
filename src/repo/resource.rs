use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{CreateResource, Resource, UpdateResource};

#[derive(Clone)]
pub struct ResourceRepository {
    pool: Arc<SqlitePool>,
}

impl ResourceRepository {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    pub async fn create(&self, project_id: Uuid, input: &CreateResource) -> Result<Resource> {
        let id = Uuid::new_v4();

        let resource = sqlx::query_as::<_, Resource>(
            r#"
            INSERT INTO resources (id, project_id, name, description, url, icon, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, datetime('now'), datetime('now'))
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(project_id)
        .bind(input.name.trim())
        .bind(&input.description)
        .bind(input.url.trim())
        .bind(&input.icon)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(resource)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Resource>> {
        let resource = sqlx::query_as::<_, Resource>("SELECT * FROM resources WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(resource)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Resource> {
        self.find_by_id(id).await?.ok_or(AppError::NotFound)
    }

    pub async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Resource>> {
        let resources = sqlx::query_as::<_, Resource>(
            "SELECT * FROM resources WHERE project_id = $1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(project_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(resources)
    }

    pub async fn update(&self, id: Uuid, input: &UpdateResource) -> Result<Resource> {
        let resource = sqlx::query_as::<_, Resource>(
            r#"
            UPDATE resources
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                url = COALESCE($4, url),
                icon = COALESCE($5, icon),
                updated_at = datetime('now')
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.description)
        .bind(input.url.as_deref().map(str::trim))
        .bind(&input.icon)
        .fetch_optional(self.pool.as_ref())
        .await?;

        resource.ok_or(AppError::NotFound)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
