use crate::models::parse_role_type;
use crate::pool::DbPool;
use crate::repositories::utils::map_db_error;
use crate::retry_db;
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use services::auth::UserId;
use services::common::RepositoryError;
use services::organization::{
    OrganizationId, OrganizationRole, OrganizationRoleRepository, OrganizationRoleType,
};
use tracing::debug;
use uuid::Uuid;

pub struct PgOrganizationRoleRepository {
    pool: DbPool,
}

impl PgOrganizationRoleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn row_to_role(row: &tokio_postgres::Row) -> Result<OrganizationRole, RepositoryError> {
        let type_text: String = row.get("role_type");
        Ok(OrganizationRole {
            id: row.get("id"),
            organization_id: OrganizationId(row.get("organization_id")),
            user_id: UserId(row.get("user_id")),
            role_type: parse_role_type(&type_text)?,
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl OrganizationRoleRepository for PgOrganizationRoleRepository {
    async fn insert(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role_type: OrganizationRoleType,
    ) -> Result<OrganizationRole, RepositoryError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        // UNIQUE(organization_id, user_id) turns a racing duplicate into
        // RepositoryError::AlreadyExists via map_db_error.
        let row = retry_db!("insert_organization_role", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query_one(
                    "INSERT INTO organization_roles (id, organization_id, user_id, role_type, created_at)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING id, organization_id, user_id, role_type, created_at",
                    &[&id, &organization_id, &user_id, &role_type.to_string(), &now],
                )
                .await
                .map_err(map_db_error)
        })?;

        debug!(organization = %organization_id, user = %user_id, "Inserted organization role");
        Self::row_to_role(&row)
    }

    async fn get_by_organization_and_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationRole>, RepositoryError> {
        let row = retry_db!("get_organization_role_by_org_and_user", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query_opt(
                    "SELECT id, organization_id, user_id, role_type, created_at
                     FROM organization_roles
                     WHERE organization_id = $1 AND user_id = $2",
                    &[&organization_id, &user_id],
                )
                .await
                .map_err(map_db_error)
        })?;

        match row {
            Some(r) => Ok(Some(Self::row_to_role(&r)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = retry_db!("delete_organization_role", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .execute("DELETE FROM organization_roles WHERE id = $1", &[&id])
                .await
                .map_err(map_db_error)
        })?;

        Ok(rows_affected > 0)
    }
}
