use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::RepositoryError;
use crate::organization::OrganizationId;

// Domain ID types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProjectId(pub Uuid);

impl From<Uuid> for ProjectId {
    fn from(uuid: Uuid) -> Self {
        ProjectId(uuid)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Translatable-content container, owned by exactly one organization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
    pub organization_id: OrganizationId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Project not found")]
    NotFound,

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

// Repository trait for project data access
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Project>, RepositoryError>;

    /// Every project the user can see, joined over direct permissions and
    /// organization roles. The same project may appear more than once when
    /// reached through several grants; callers deduplicate.
    async fn find_all_permitted(&self, user_id: Uuid) -> Result<Vec<Project>, RepositoryError>;

    async fn find_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Project>, RepositoryError>;

    /// Page of projects for an organization plus the total row count
    async fn find_by_organization_paged(
        &self,
        organization_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Project>, i64), RepositoryError>;
}

/// Service trait for project queries
#[async_trait]
pub trait ProjectServiceTrait: Send + Sync {
    async fn get_project(&self, id: ProjectId) -> Result<Project, ProjectError>;

    /// Every project the user reaches via a direct permission or an
    /// organization role, each returned exactly once
    async fn list_permitted_projects(
        &self,
        user_id: crate::auth::UserId,
    ) -> Result<Vec<Project>, ProjectError>;

    async fn list_projects_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Project>, ProjectError>;

    async fn list_projects_by_organization_paged(
        &self,
        organization_id: OrganizationId,
        page: PageRequest,
    ) -> Result<Page<Project>, ProjectError>;
}
