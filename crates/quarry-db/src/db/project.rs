use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use quarry_core::models::Project;
use quarry_core::{AppError, ProjectLookup};

/// Read-only access to projects joined with their owning namespace and its
/// current plan. The decision core consumes this through [`ProjectLookup`].
#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a project with its ownership data, or None when it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT
                p.id,
                p.namespace_id,
                p.path,
                p.visibility,
                n.plan_id
            FROM projects p
            JOIN namespaces n ON n.id = p.namespace_id
            WHERE p.id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, project_id = %project_id, "Failed to fetch project");
            AppError::Database(e)
        })?;

        Ok(project)
    }
}

#[async_trait]
impl ProjectLookup for ProjectRepository {
    async fn project(&self, project_id: Uuid) -> Result<Option<Project>, AppError> {
        self.get_project(project_id).await
    }
}
