// Test utilities for services crate
#![cfg(test)]

use crate::auth::ports::{AuthError, AuthenticationFacade, UserId};
use crate::common::RepositoryError;
use crate::invitation::{Invitation, InvitationGrant, InvitationRepository};
use crate::organization::{
    OrganizationId, OrganizationRole, OrganizationRoleRepository, OrganizationRoleType,
};
use crate::permission::{Permission, PermissionRepository, PermissionType};
use crate::project::{Project, ProjectId, ProjectRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Resolves to a fixed user, or to nobody
pub struct StaticAuthenticationFacade {
    user: Option<UserId>,
}

impl StaticAuthenticationFacade {
    pub fn new(user: Option<UserId>) -> Self {
        Self { user }
    }
}

#[async_trait]
impl AuthenticationFacade for StaticAuthenticationFacade {
    async fn current_user(&self) -> Result<UserId, AuthError> {
        self.user.clone().ok_or(AuthError::Unauthenticated)
    }
}

#[derive(Default)]
pub struct InMemoryPermissionRepository {
    rows: Mutex<Vec<Permission>>,
}

impl InMemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionRepository for InMemoryPermissionRepository {
    async fn insert(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        permission_type: PermissionType,
    ) -> Result<Permission, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|p| p.project_id.0 == project_id && p.user_id.0 == user_id)
        {
            return Err(RepositoryError::AlreadyExists);
        }
        let permission = Permission {
            id: Uuid::new_v4(),
            project_id: ProjectId(project_id),
            user_id: UserId(user_id),
            permission_type,
            created_at: Utc::now(),
        };
        rows.push(permission.clone());
        Ok(permission)
    }

    async fn get_by_project_and_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Permission>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.project_id.0 == project_id && p.user_id.0 == user_id)
            .cloned())
    }

    async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Permission>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.project_id.0 == project_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() < before)
    }
}

#[derive(Default)]
pub struct InMemoryOrganizationRoleRepository {
    rows: Mutex<Vec<OrganizationRole>>,
}

impl InMemoryOrganizationRoleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationRoleRepository for InMemoryOrganizationRoleRepository {
    async fn insert(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role_type: OrganizationRoleType,
    ) -> Result<OrganizationRole, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|r| r.organization_id.0 == organization_id && r.user_id.0 == user_id)
        {
            return Err(RepositoryError::AlreadyExists);
        }
        let role = OrganizationRole {
            id: Uuid::new_v4(),
            organization_id: OrganizationId(organization_id),
            user_id: UserId(user_id),
            role_type,
            created_at: Utc::now(),
        };
        rows.push(role.clone());
        Ok(role)
    }

    async fn get_by_organization_and_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationRole>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.organization_id.0 == organization_id && r.user_id.0 == user_id)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }
}

/// Projects plus the grant rows the permitted-projects join walks over
#[derive(Default)]
pub struct InMemoryProjectRepository {
    projects: Mutex<Vec<Project>>,
    permissions: Mutex<Vec<(Uuid, Uuid)>>,
    roles: Mutex<Vec<(Uuid, Uuid)>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&self, name: &str, organization_id: OrganizationId) -> Project {
        let project = Project {
            id: ProjectId(Uuid::new_v4()),
            name: name.to_string(),
            description: None,
            organization_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.projects.lock().unwrap().push(project.clone());
        project
    }

    pub fn grant_permission(&self, project: &Project, user: &UserId, _type: PermissionType) {
        self.permissions
            .lock()
            .unwrap()
            .push((project.id.0, user.0));
    }

    pub fn grant_role(
        &self,
        organization: &OrganizationId,
        user: &UserId,
        _type: OrganizationRoleType,
    ) {
        self.roles.lock().unwrap().push((organization.0, user.0));
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Project>, RepositoryError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id.0 == id)
            .cloned())
    }

    async fn find_all_permitted(&self, user_id: Uuid) -> Result<Vec<Project>, RepositoryError> {
        let projects = self.projects.lock().unwrap();
        let permissions = self.permissions.lock().unwrap();
        let roles = self.roles.lock().unwrap();

        // One row per matching grant, like the SQL join.
        let mut rows = Vec::new();
        for project in projects.iter() {
            for _ in permissions
                .iter()
                .filter(|(p, u)| *p == project.id.0 && *u == user_id)
            {
                rows.push(project.clone());
            }
            for _ in roles
                .iter()
                .filter(|(o, u)| *o == project.organization_id.0 && *u == user_id)
            {
                rows.push(project.clone());
            }
        }
        Ok(rows)
    }

    async fn find_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Project>, RepositoryError> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.organization_id.0 == organization_id)
            .cloned()
            .collect())
    }

    async fn find_by_organization_paged(
        &self,
        organization_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Project>, i64), RepositoryError> {
        let all = self.find_by_organization(organization_id).await?;
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((items, total))
    }
}

#[derive(Default)]
pub struct InMemoryInvitationRepository {
    rows: Mutex<Vec<Invitation>>,
    poisoned: AtomicBool,
}

impl InMemoryInvitationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next read fail the way a corrupt grant row does
    pub fn poison_next_read(&self) {
        self.poisoned.store(true, Ordering::SeqCst);
    }

    fn check_poison(&self) -> Result<(), RepositoryError> {
        if self.poisoned.swap(false, Ordering::SeqCst) {
            return Err(RepositoryError::DataConversionError(anyhow::anyhow!(
                "invitation row must carry exactly one grant"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl InvitationRepository for InMemoryInvitationRepository {
    async fn insert(&self, invitation: &Invitation) -> Result<Invitation, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|i| i.code == invitation.code) {
            return Err(RepositoryError::AlreadyExists);
        }
        rows.push(invitation.clone());
        Ok(invitation.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Invitation>, RepositoryError> {
        self.check_poison()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Invitation>, RepositoryError> {
        self.check_poison()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.code == code)
            .cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|i| i.id != id);
        Ok(rows.len() < before)
    }

    async fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|i| i.created_at >= cutoff);
        Ok((before - rows.len()) as u64)
    }

    async fn list_by_project(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<Invitation>, RepositoryError> {
        let mut matches: Vec<Invitation> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|i| {
                matches!(
                    &i.grant,
                    InvitationGrant::ProjectPermission { project_id: p, .. } if p.0 == project_id
                )
            })
            .cloned()
            .collect();
        matches.sort_by_key(|i| i.created_at);
        Ok(matches)
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Invitation>, RepositoryError> {
        let mut matches: Vec<Invitation> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|i| {
                matches!(
                    &i.grant,
                    InvitationGrant::OrganizationRole { organization_id: o, .. }
                        if o.0 == organization_id
                )
            })
            .cloned()
            .collect();
        matches.sort_by_key(|i| i.created_at);
        Ok(matches)
    }
}
