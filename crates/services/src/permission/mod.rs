pub mod ports;

pub use ports::*;
use std::sync::Arc;

use crate::auth::ports::UserId;
use crate::common::RepositoryError;
use crate::project::ProjectId;
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

pub struct PermissionServiceImpl {
    repository: Arc<dyn PermissionRepository>,
}

impl PermissionServiceImpl {
    pub fn new(repository: Arc<dyn PermissionRepository>) -> Self {
        Self { repository }
    }

    fn map_repository_error(err: RepositoryError) -> PermissionError {
        match err {
            RepositoryError::AlreadyExists => PermissionError::AlreadyExists,
            other => PermissionError::InternalError(format!("Repository error: {}", other)),
        }
    }
}

#[async_trait]
impl PermissionServiceTrait for PermissionServiceImpl {
    async fn grant(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        permission_type: PermissionType,
    ) -> Result<Permission, PermissionError> {
        let permission = self
            .repository
            .insert(project_id.0, user_id.0, permission_type)
            .await
            .map_err(Self::map_repository_error)?;

        debug!(
            project = %project_id,
            user = %user_id,
            r#type = %permission_type,
            "Granted project permission"
        );
        Ok(permission)
    }

    async fn get_by_project_and_user(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Permission>, PermissionError> {
        self.repository
            .get_by_project_and_user(project_id.0, user_id.0)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Permission>, PermissionError> {
        self.repository
            .list_by_project(project_id.0)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn revoke(&self, permission_id: Uuid) -> Result<(), PermissionError> {
        let deleted = self
            .repository
            .delete(permission_id)
            .await
            .map_err(Self::map_repository_error)?;

        if !deleted {
            return Err(PermissionError::NotFound);
        }

        debug!(permission = %permission_id, "Revoked project permission");
        Ok(())
    }
}
