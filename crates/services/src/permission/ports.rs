use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::ports::UserId;
use crate::common::RepositoryError;
use crate::project::ProjectId;

/// Capability level a user holds on a single project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PermissionType {
    View,
    Translate,
    Edit,
    Manage,
}

impl std::fmt::Display for PermissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionType::View => write!(f, "view"),
            PermissionType::Translate => write!(f, "translate"),
            PermissionType::Edit => write!(f, "edit"),
            PermissionType::Manage => write!(f, "manage"),
        }
    }
}

impl std::str::FromStr for PermissionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(PermissionType::View),
            "translate" => Ok(PermissionType::Translate),
            "edit" => Ok(PermissionType::Edit),
            "manage" => Ok(PermissionType::Manage),
            other => Err(format!("Invalid permission type: {}", other)),
        }
    }
}

/// Direct user grant on a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    pub id: Uuid,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub permission_type: PermissionType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PermissionError {
    #[error("User already has permissions on this project")]
    AlreadyExists,

    #[error("Permission not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(String),
}

// Repository trait for permission data access
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Insert a permission grant. Storage enforces UNIQUE(project_id, user_id),
    /// so a concurrent duplicate surfaces as `RepositoryError::AlreadyExists`.
    async fn insert(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        permission_type: PermissionType,
    ) -> Result<Permission, RepositoryError>;

    async fn get_by_project_and_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Permission>, RepositoryError>;

    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Permission>, RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Service trait for permission operations
#[async_trait]
pub trait PermissionServiceTrait: Send + Sync {
    /// Grant a permission of the given type to a user on a project
    async fn grant(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        permission_type: PermissionType,
    ) -> Result<Permission, PermissionError>;

    /// Get the user's direct permission on a project, if any
    async fn get_by_project_and_user(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Option<Permission>, PermissionError>;

    /// List every direct permission on a project
    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Permission>, PermissionError>;

    /// Remove a previously granted permission
    async fn revoke(&self, permission_id: Uuid) -> Result<(), PermissionError>;
}
