use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::ports::UserId;
use crate::common::RepositoryError;

// Domain ID types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct OrganizationId(pub Uuid);

impl From<Uuid> for OrganizationId {
    fn from(uuid: Uuid) -> Self {
        OrganizationId(uuid)
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role within an organization. A role implicitly covers every project the
/// organization owns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationRoleType {
    Member,
    Owner,
}

impl std::fmt::Display for OrganizationRoleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrganizationRoleType::Member => write!(f, "member"),
            OrganizationRoleType::Owner => write!(f, "owner"),
        }
    }
}

impl std::str::FromStr for OrganizationRoleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(OrganizationRoleType::Member),
            "owner" => Ok(OrganizationRoleType::Owner),
            other => Err(format!("Invalid organization role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganizationRole {
    pub id: Uuid,
    pub organization_id: OrganizationId,
    pub user_id: UserId,
    pub role_type: OrganizationRoleType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum OrganizationRoleError {
    #[error("User already has a role in this organization")]
    AlreadyExists,

    #[error("Organization role not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(String),
}

// Repository trait for organization-role data access
#[async_trait]
pub trait OrganizationRoleRepository: Send + Sync {
    /// Insert a role grant. Storage enforces UNIQUE(organization_id, user_id),
    /// so a concurrent duplicate surfaces as `RepositoryError::AlreadyExists`.
    async fn insert(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role_type: OrganizationRoleType,
    ) -> Result<OrganizationRole, RepositoryError>;

    async fn get_by_organization_and_user(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationRole>, RepositoryError>;

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;
}

/// Service trait for organization-role operations
#[async_trait]
pub trait OrganizationRoleServiceTrait: Send + Sync {
    /// Grant a role to a user within an organization
    async fn grant(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
        role_type: OrganizationRoleType,
    ) -> Result<OrganizationRole, OrganizationRoleError>;

    /// Check whether the user holds any role (member or owner) in the organization
    async fn is_member_or_owner(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<bool, OrganizationRoleError>;

    /// Get the user's role in the organization, if any
    async fn get_role(
        &self,
        organization_id: OrganizationId,
        user_id: UserId,
    ) -> Result<Option<OrganizationRole>, OrganizationRoleError>;

    /// Remove a previously granted role
    async fn revoke(&self, role_id: Uuid) -> Result<(), OrganizationRoleError>;
}
