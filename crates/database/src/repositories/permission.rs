use crate::models::parse_permission_type;
use crate::pool::DbPool;
use crate::repositories::utils::map_db_error;
use crate::retry_db;
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use services::auth::UserId;
use services::common::RepositoryError;
use services::permission::{Permission, PermissionRepository, PermissionType};
use services::project::ProjectId;
use tracing::debug;
use uuid::Uuid;

pub struct PgPermissionRepository {
    pool: DbPool,
}

impl PgPermissionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_permission(row: &tokio_postgres::Row) -> Result<Permission, RepositoryError> {
        let type_text: String = row.get("permission_type");
        Ok(Permission {
            id: row.get("id"),
            project_id: ProjectId(row.get("project_id")),
            user_id: UserId(row.get("user_id")),
            permission_type: parse_permission_type(&type_text)?,
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl PermissionRepository for PgPermissionRepository {
    async fn insert(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        permission_type: PermissionType,
    ) -> Result<Permission, RepositoryError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        // UNIQUE(project_id, user_id) turns a racing duplicate into
        // RepositoryError::AlreadyExists via map_db_error.
        let row = retry_db!("insert_permission", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query_one(
                    "INSERT INTO permissions (id, project_id, user_id, permission_type, created_at)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING id, project_id, user_id, permission_type, created_at",
                    &[&id, &project_id, &user_id, &permission_type.to_string(), &now],
                )
                .await
                .map_err(map_db_error)
        })?;

        debug!(project = %project_id, user = %user_id, "Inserted permission");
        Self::row_to_permission(&row)
    }

    async fn get_by_project_and_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Permission>, RepositoryError> {
        let row = retry_db!("get_permission_by_project_and_user", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query_opt(
                    "SELECT id, project_id, user_id, permission_type, created_at
                     FROM permissions
                     WHERE project_id = $1 AND user_id = $2",
                    &[&project_id, &user_id],
                )
                .await
                .map_err(map_db_error)
        })?;

        match row {
            Some(r) => Ok(Some(Self::row_to_permission(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Permission>, RepositoryError> {
        let rows = retry_db!("list_permissions_by_project", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query(
                    "SELECT id, project_id, user_id, permission_type, created_at
                     FROM permissions
                     WHERE project_id = $1
                     ORDER BY created_at",
                    &[&project_id],
                )
                .await
                .map_err(map_db_error)
        })?;

        rows.iter().map(Self::row_to_permission).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = retry_db!("delete_permission", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .execute("DELETE FROM permissions WHERE id = $1", &[&id])
                .await
                .map_err(map_db_error)
        })?;

        Ok(rows_affected > 0)
    }
}
