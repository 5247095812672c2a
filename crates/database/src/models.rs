use anyhow::anyhow;
use chrono::{DateTime, Utc};
use services::common::RepositoryError;
use services::invitation::{Invitation, InvitationGrant};
use services::organization::{OrganizationId, OrganizationRoleType};
use services::permission::PermissionType;
use services::project::ProjectId;
use uuid::Uuid;

/// Raw invitation row. The grant columns come in two nullable pairs; the
/// schema CHECK constraint keeps exactly one pair populated, and the
/// conversion below re-validates that shape before anything downstream
/// sees the row.
#[derive(Debug, Clone)]
pub struct InvitationRow {
    pub id: Uuid,
    pub code: String,
    pub project_id: Option<Uuid>,
    pub permission_type: Option<String>,
    pub organization_id: Option<Uuid>,
    pub role_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InvitationRow {
    pub fn from_row(row: &tokio_postgres::Row) -> Self {
        Self {
            id: row.get("id"),
            code: row.get("code"),
            project_id: row.get("project_id"),
            permission_type: row.get("permission_type"),
            organization_id: row.get("organization_id"),
            role_type: row.get("role_type"),
            created_at: row.get("created_at"),
        }
    }

    pub fn into_domain(self) -> Result<Invitation, RepositoryError> {
        let grant = match (
            self.project_id,
            self.permission_type,
            self.organization_id,
            self.role_type,
        ) {
            (Some(project_id), Some(permission_type), None, None) => {
                InvitationGrant::ProjectPermission {
                    project_id: ProjectId(project_id),
                    permission_type: parse_permission_type(&permission_type)?,
                }
            }
            (None, None, Some(organization_id), Some(role_type)) => {
                InvitationGrant::OrganizationRole {
                    organization_id: OrganizationId(organization_id),
                    role_type: parse_role_type(&role_type)?,
                }
            }
            _ => {
                return Err(RepositoryError::DataConversionError(anyhow!(
                    "invitation {} must carry exactly one grant",
                    self.id
                )))
            }
        };

        Ok(Invitation {
            id: self.id,
            code: self.code,
            grant,
            created_at: self.created_at,
        })
    }
}

/// Grant columns of an invitation, flattened for insertion
pub fn grant_columns(
    grant: &InvitationGrant,
) -> (Option<Uuid>, Option<String>, Option<Uuid>, Option<String>) {
    match grant {
        InvitationGrant::ProjectPermission {
            project_id,
            permission_type,
        } => (
            Some(project_id.0),
            Some(permission_type.to_string()),
            None,
            None,
        ),
        InvitationGrant::OrganizationRole {
            organization_id,
            role_type,
        } => (
            None,
            None,
            Some(organization_id.0),
            Some(role_type.to_string()),
        ),
    }
}

pub fn parse_permission_type(value: &str) -> Result<PermissionType, RepositoryError> {
    value
        .parse()
        .map_err(|e: String| RepositoryError::DataConversionError(anyhow!(e)))
}

pub fn parse_role_type(value: &str) -> Result<OrganizationRoleType, RepositoryError> {
    value
        .parse()
        .map_err(|e: String| RepositoryError::DataConversionError(anyhow!(e)))
}
