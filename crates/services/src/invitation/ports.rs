use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::RepositoryError;
use crate::organization::{OrganizationId, OrganizationRoleType};
use crate::permission::PermissionType;
use crate::project::ProjectId;

/// The grant an invitation will hand out on acceptance. Exactly one of a
/// project permission or an organization role, guaranteed by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvitationGrant {
    ProjectPermission {
        project_id: ProjectId,
        permission_type: PermissionType,
    },
    OrganizationRole {
        organization_id: OrganizationId,
        role_type: OrganizationRoleType,
    },
}

/// Code-addressed pending grant, consumed on acceptance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Invitation {
    pub id: Uuid,
    pub code: String,
    pub grant: InvitationGrant,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum InvitationError {
    /// The sign-up flow branches on this kind to tell "no such invitation"
    /// apart from other failures. Do not rename or fold into another variant.
    #[error("Invitation code does not exist or is expired")]
    NotFoundOrExpired,

    #[error("User already has permissions on this project")]
    AlreadyHasPermission,

    #[error("User already has a role in this organization")]
    AlreadyHasRole,

    /// A stored invitation carries both or neither grant. Never user-facing;
    /// indicates corrupt data.
    #[error("Invitation grant state is corrupt: {0}")]
    InvariantViolation(String),

    #[error("No authenticated user to accept the invitation")]
    Unauthenticated,

    #[error("Internal error: {0}")]
    InternalError(String),
}

// Repository trait for invitation data access
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    async fn insert(&self, invitation: &Invitation) -> Result<Invitation, RepositoryError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Invitation>, RepositoryError>;

    async fn get_by_code(&self, code: &str) -> Result<Option<Invitation>, RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Delete every invitation created strictly before the cutoff, returning
    /// the number of rows removed
    async fn delete_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Invitations carrying a permission on the project, ordered by creation time
    async fn list_by_project(&self, project_id: Uuid)
        -> Result<Vec<Invitation>, RepositoryError>;

    /// Invitations carrying a role in the organization, ordered by creation time
    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<Invitation>, RepositoryError>;
}

/// Service trait for invitation issuance, acceptance and cleanup
#[async_trait]
pub trait InvitationServiceTrait: Send + Sync {
    /// Issue an invitation granting a permission on a project; returns the code
    async fn create_for_project(
        &self,
        project_id: ProjectId,
        permission_type: PermissionType,
    ) -> Result<String, InvitationError>;

    /// Issue an invitation granting a role in an organization
    async fn create_for_organization(
        &self,
        organization_id: OrganizationId,
        role_type: OrganizationRoleType,
    ) -> Result<Invitation, InvitationError>;

    /// Resolve a code to its live invitation
    async fn get_by_code(&self, code: &str) -> Result<Invitation, InvitationError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>, InvitationError>;

    /// Consume the invitation: hand its grant to the user and delete the record
    async fn accept(&self, code: &str, user_id: crate::auth::UserId)
        -> Result<(), InvitationError>;

    /// Accept on behalf of the currently authenticated user
    async fn accept_with_current_user(&self, code: &str) -> Result<(), InvitationError>;

    /// Delete every invitation older than the expiry threshold, returning the
    /// number removed
    async fn remove_expired(&self) -> Result<u64, InvitationError>;

    /// Revoke an unconsumed invitation
    async fn delete(&self, invitation: &Invitation) -> Result<(), InvitationError>;

    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Invitation>, InvitationError>;

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Invitation>, InvitationError>;
}
