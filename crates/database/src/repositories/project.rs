use crate::pool::DbPool;
use crate::repositories::utils::map_db_error;
use crate::retry_db;
use anyhow::Context;
use async_trait::async_trait;
use services::common::RepositoryError;
use services::organization::OrganizationId;
use services::project::{Project, ProjectId, ProjectRepository};
use uuid::Uuid;

pub struct PgProjectRepository {
    pool: DbPool,
}

impl PgProjectRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_project(row: &tokio_postgres::Row) -> Project {
        Project {
            id: ProjectId(row.get("id")),
            name: row.get("name"),
            description: row.get("description"),
            organization_id: OrganizationId(row.get("organization_id")),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Project>, RepositoryError> {
        let row = retry_db!("get_project_by_id", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query_opt(
                    "SELECT id, name, description, organization_id, created_at, updated_at
                     FROM projects
                     WHERE id = $1",
                    &[&id],
                )
                .await
                .map_err(map_db_error)
        })?;

        Ok(row.map(|r| Self::row_to_project(&r)))
    }

    async fn find_all_permitted(&self, user_id: Uuid) -> Result<Vec<Project>, RepositoryError> {
        // One row per matching grant; the service layer deduplicates.
        let rows = retry_db!("find_all_permitted_projects", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query(
                    "SELECT p.id, p.name, p.description, p.organization_id, p.created_at, p.updated_at
                     FROM projects p
                     LEFT JOIN permissions perm
                       ON perm.project_id = p.id AND perm.user_id = $1
                     LEFT JOIN organization_roles org_role
                       ON org_role.organization_id = p.organization_id AND org_role.user_id = $1
                     WHERE perm.id IS NOT NULL OR org_role.id IS NOT NULL
                     ORDER BY p.created_at",
                    &[&user_id],
                )
                .await
                .map_err(map_db_error)
        })?;

        Ok(rows.iter().map(Self::row_to_project).collect())
    }

    async fn find_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Project>, RepositoryError> {
        let rows = retry_db!("find_projects_by_organization", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query(
                    "SELECT id, name, description, organization_id, created_at, updated_at
                     FROM projects
                     WHERE organization_id = $1
                     ORDER BY created_at",
                    &[&organization_id],
                )
                .await
                .map_err(map_db_error)
        })?;

        Ok(rows.iter().map(Self::row_to_project).collect())
    }

    async fn find_by_organization_paged(
        &self,
        organization_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Project>, i64), RepositoryError> {
        let (rows, total) = retry_db!("find_projects_by_organization_paged", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            let count_row = client
                .query_one(
                    "SELECT COUNT(*) AS total FROM projects WHERE organization_id = $1",
                    &[&organization_id],
                )
                .await
                .map_err(map_db_error)?;
            let total: i64 = count_row.get("total");

            let rows = client
                .query(
                    "SELECT id, name, description, organization_id, created_at, updated_at
                     FROM projects
                     WHERE organization_id = $1
                     ORDER BY created_at
                     LIMIT $2 OFFSET $3",
                    &[&organization_id, &limit, &offset],
                )
                .await
                .map_err(map_db_error)?;

            Ok((rows, total))
        })?;

        Ok((rows.iter().map(Self::row_to_project).collect(), total))
    }
}
