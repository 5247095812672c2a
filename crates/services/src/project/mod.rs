pub mod ports;

pub use ports::*;
use std::collections::HashSet;
use std::sync::Arc;

use crate::auth::ports::UserId;
use crate::common::RepositoryError;
use crate::organization::OrganizationId;
use async_trait::async_trait;

pub struct ProjectServiceImpl {
    repository: Arc<dyn ProjectRepository>,
}

impl ProjectServiceImpl {
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        Self { repository }
    }

    fn map_repository_error(err: RepositoryError) -> ProjectError {
        ProjectError::InternalError(format!("Repository error: {}", err))
    }
}

#[async_trait]
impl ProjectServiceTrait for ProjectServiceImpl {
    async fn get_project(&self, id: ProjectId) -> Result<Project, ProjectError> {
        self.repository
            .get_by_id(id.0)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or(ProjectError::NotFound)
    }

    async fn list_permitted_projects(&self, user_id: UserId) -> Result<Vec<Project>, ProjectError> {
        let rows = self
            .repository
            .find_all_permitted(user_id.0)
            .await
            .map_err(Self::map_repository_error)?;

        // The join produces one row per matching grant; keep the first
        // occurrence of each project.
        let mut seen = HashSet::new();
        let mut projects = Vec::with_capacity(rows.len());
        for project in rows {
            if seen.insert(project.id.0) {
                projects.push(project);
            }
        }
        Ok(projects)
    }

    async fn list_projects_by_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Project>, ProjectError> {
        self.repository
            .find_by_organization(organization_id.0)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn list_projects_by_organization_paged(
        &self,
        organization_id: OrganizationId,
        page: PageRequest,
    ) -> Result<Page<Project>, ProjectError> {
        if page.page < 0 {
            return Err(ProjectError::InvalidParams(
                "Page index cannot be negative".to_string(),
            ));
        }
        if page.page_size <= 0 {
            return Err(ProjectError::InvalidParams(
                "Page size must be positive".to_string(),
            ));
        }

        let offset = page.page * page.page_size;
        let (items, total) = self
            .repository
            .find_by_organization_paged(organization_id.0, page.page_size, offset)
            .await
            .map_err(Self::map_repository_error)?;

        Ok(Page {
            items,
            page: page.page,
            page_size: page.page_size,
            total,
        })
    }
}
