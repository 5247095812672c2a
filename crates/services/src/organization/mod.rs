pub mod ports;

pub use ports::*;
use std::sync::Arc;

use crate::auth::ports::UserId;
use crate::common::RepositoryError;
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

pub struct OrganizationRoleServiceImpl {
    repository: Arc<dyn OrganizationRoleRepository>,
}

impl OrganizationRoleServiceImpl {
    pub fn new(repository: Arc<dyn OrganizationRoleRepository>) -> Self {
        Self { repository }
    }

    fn map_repository_error(err: RepositoryError) -> OrganizationRoleError {
        match err {
            RepositoryError::AlreadyExists => OrganizationRoleError::AlreadyExists,
            other => {
                OrganizationRoleError::InternalError(format!("Repository error: {}", other))
            }
        }
    }
}

#[async_trait]
impl OrganizationRoleServiceTrait for OrganizationRoleServiceImpl {
    async fn grant(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
        role_type: OrganizationRoleType,
    ) -> Result<OrganizationRole, OrganizationRoleError> {
        let role = self
            .repository
            .insert(organization_id.0, user_id.0, role_type)
            .await
            .map_err(Self::map_repository_error)?;

        debug!(
            organization = %organization_id,
            user = %user_id,
            role = %role_type,
            "Granted organization role"
        );
        Ok(role)
    }

    async fn is_member_or_owner(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<bool, OrganizationRoleError> {
        let role = self
            .repository
            .get_by_organization_and_user(organization_id.0, user_id.0)
            .await
            .map_err(Self::map_repository_error)?;

        Ok(role.is_some())
    }

    async fn get_role(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<Option<OrganizationRole>, OrganizationRoleError> {
        self.repository
            .get_by_organization_and_user(organization_id.0, user_id.0)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn revoke(&self, role_id: Uuid) -> Result<(), OrganizationRoleError> {
        let deleted = self
            .repository
            .delete(role_id)
            .await
            .map_err(Self::map_repository_error)?;

        if !deleted {
            return Err(OrganizationRoleError::NotFound);
        }

        debug!(role = %role_id, "Revoked organization role");
        Ok(())
    }
}
