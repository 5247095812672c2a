use crate::models::{grant_columns, InvitationRow};
use crate::pool::DbPool;
use crate::repositories::utils::map_db_error;
use crate::retry_db;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use services::common::RepositoryError;
use services::invitation::{Invitation, InvitationRepository};
use tracing::debug;
use uuid::Uuid;

pub struct PgInvitationRepository {
    pool: DbPool,
}

impl PgInvitationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvitationRepository for PgInvitationRepository {
    async fn insert(&self, invitation: &Invitation) -> Result<Invitation, RepositoryError> {
        let (project_id, permission_type, organization_id, role_type) =
            grant_columns(&invitation.grant);

        let row = retry_db!("insert_invitation", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query_one(
                    "INSERT INTO invitations
                     (id, code, project_id, permission_type, organization_id, role_type, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7)
                     RETURNING id, code, project_id, permission_type, organization_id, role_type, created_at",
                    &[
                        &invitation.id,
                        &invitation.code,
                        &project_id,
                        &permission_type,
                        &organization_id,
                        &role_type,
                        &invitation.created_at,
                    ],
                )
                .await
                .map_err(map_db_error)
        })?;

        debug!(invitation = %invitation.id, "Inserted invitation");
        InvitationRow::from_row(&row).into_domain()
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Invitation>, RepositoryError> {
        let row = retry_db!("get_invitation_by_id", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query_opt(
                    "SELECT id, code, project_id, permission_type, organization_id, role_type, created_at
                     FROM invitations
                     WHERE id = $1",
                    &[&id],
                )
                .await
                .map_err(map_db_error)
        })?;

        match row {
            Some(r) => Ok(Some(InvitationRow::from_row(&r).into_domain()?)),
            None => Ok(None),
        }
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Invitation>, RepositoryError> {
        let row = retry_db!("get_invitation_by_code", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query_opt(
                    "SELECT id, code, project_id, permission_type, organization_id, role_type, created_at
                     FROM invitations
                     WHERE code = $1",
                    &[&code],
                )
                .await
                .map_err(map_db_error)
        })?;

        match row {
            Some(r) => Ok(Some(InvitationRow::from_row(&r).into_domain()?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let rows_affected = retry_db!("delete_invitation", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .execute("DELETE FROM invitations WHERE id = $1", &[&id])
                .await
                .map_err(map_db_error)
        })?;

        Ok(rows_affected > 0)
    }

    async fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let rows_affected = retry_db!("delete_expired_invitations", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .execute("DELETE FROM invitations WHERE created_at < $1", &[&cutoff])
                .await
                .map_err(map_db_error)
        })?;

        if rows_affected > 0 {
            debug!(removed = rows_affected, "Deleted expired invitations");
        }
        Ok(rows_affected)
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Invitation>, RepositoryError> {
        let rows = retry_db!("list_invitations_by_project", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query(
                    "SELECT id, code, project_id, permission_type, organization_id, role_type, created_at
                     FROM invitations
                     WHERE project_id = $1
                     ORDER BY created_at",
                    &[&project_id],
                )
                .await
                .map_err(map_db_error)
        })?;

        rows.iter()
            .map(|r| InvitationRow::from_row(r).into_domain())
            .collect()
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Invitation>, RepositoryError> {
        let rows = retry_db!("list_invitations_by_organization", {
            let client = self
                .pool
                .get()
                .await
                .context("Failed to get database connection")
                .map_err(RepositoryError::PoolError)?;

            client
                .query(
                    "SELECT id, code, project_id, permission_type, organization_id, role_type, created_at
                     FROM invitations
                     WHERE organization_id = $1
                     ORDER BY created_at",
                    &[&organization_id],
                )
                .await
                .map_err(map_db_error)
        })?;

        rows.iter()
            .map(|r| InvitationRow::from_row(r).into_domain())
            .collect()
    }
}
