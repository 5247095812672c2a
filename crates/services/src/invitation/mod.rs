pub mod ports;

pub use ports::*;
use std::sync::Arc;

use crate::auth::ports::{AuthError, AuthenticationFacade, UserId};
use crate::common::RepositoryError;
use crate::organization::{OrganizationId, OrganizationRoleError, OrganizationRoleServiceTrait, OrganizationRoleType};
use crate::permission::{PermissionError, PermissionServiceTrait, PermissionType};
use crate::project::ProjectId;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

/// Length of the public, unguessable invitation code
pub const INVITATION_CODE_LENGTH: usize = 50;

/// Invitations older than this are removed by the expiry sweep
pub const INVITATION_EXPIRY_DAYS: i64 = 30;

const CODE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..INVITATION_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CODE_CHARSET.len());
            CODE_CHARSET[idx] as char
        })
        .collect()
}

pub struct InvitationServiceImpl {
    invitation_repository: Arc<dyn InvitationRepository>,
    permission_service: Arc<dyn PermissionServiceTrait>,
    organization_role_service: Arc<dyn OrganizationRoleServiceTrait>,
    authentication: Arc<dyn AuthenticationFacade>,
}

impl InvitationServiceImpl {
    pub fn new(
        invitation_repository: Arc<dyn InvitationRepository>,
        permission_service: Arc<dyn PermissionServiceTrait>,
        organization_role_service: Arc<dyn OrganizationRoleServiceTrait>,
        authentication: Arc<dyn AuthenticationFacade>,
    ) -> Self {
        Self {
            invitation_repository,
            permission_service,
            organization_role_service,
            authentication,
        }
    }

    fn map_repository_error(err: RepositoryError) -> InvitationError {
        match err {
            // The only conversion failures for invitation rows are grant
            // columns that violate the exactly-one shape or unknown enum
            // text, both of which mean corrupt storage.
            RepositoryError::DataConversionError(e) => {
                InvitationError::InvariantViolation(e.to_string())
            }
            other => InvitationError::InternalError(format!("Repository error: {}", other)),
        }
    }

    async fn accept_project_grant(
        &self,
        project_id: ProjectId,
        permission_type: PermissionType,
        user_id: UserId,
    ) -> Result<(), InvitationError> {
        let existing = self
            .permission_service
            .get_by_project_and_user(project_id.clone(), user_id.clone())
            .await
            .map_err(|e| InvitationError::InternalError(format!("Permission lookup failed: {}", e)))?;
        if existing.is_some() {
            return Err(InvitationError::AlreadyHasPermission);
        }

        self.permission_service
            .grant(project_id, user_id, permission_type)
            .await
            .map_err(|e| match e {
                // A concurrent accept lost the race to the uniqueness
                // constraint; same outcome as the pre-check.
                PermissionError::AlreadyExists => InvitationError::AlreadyHasPermission,
                other => InvitationError::InternalError(format!("Permission grant failed: {}", other)),
            })?;
        Ok(())
    }

    async fn accept_organization_grant(
        &self,
        organization_id: OrganizationId,
        role_type: OrganizationRoleType,
        user_id: UserId,
    ) -> Result<(), InvitationError> {
        let already_member = self
            .organization_role_service
            .is_member_or_owner(organization_id.clone(), user_id.clone())
            .await
            .map_err(|e| InvitationError::InternalError(format!("Membership check failed: {}", e)))?;
        if already_member {
            return Err(InvitationError::AlreadyHasRole);
        }

        self.organization_role_service
            .grant(organization_id, user_id, role_type)
            .await
            .map_err(|e| match e {
                OrganizationRoleError::AlreadyExists => InvitationError::AlreadyHasRole,
                other => InvitationError::InternalError(format!("Role grant failed: {}", other)),
            })?;
        Ok(())
    }
}

#[async_trait]
impl InvitationServiceTrait for InvitationServiceImpl {
    async fn create_for_project(
        &self,
        project_id: ProjectId,
        permission_type: PermissionType,
    ) -> Result<String, InvitationError> {
        let invitation = Invitation {
            id: Uuid::new_v4(),
            code: generate_code(),
            grant: InvitationGrant::ProjectPermission {
                project_id: project_id.clone(),
                permission_type,
            },
            created_at: Utc::now(),
        };

        let stored = self
            .invitation_repository
            .insert(&invitation)
            .await
            .map_err(Self::map_repository_error)?;

        debug!(
            invitation = %stored.id,
            project = %project_id,
            r#type = %permission_type,
            "Created project invitation"
        );
        Ok(stored.code)
    }

    async fn create_for_organization(
        &self,
        organization_id: OrganizationId,
        role_type: OrganizationRoleType,
    ) -> Result<Invitation, InvitationError> {
        let invitation = Invitation {
            id: Uuid::new_v4(),
            code: generate_code(),
            grant: InvitationGrant::OrganizationRole {
                organization_id: organization_id.clone(),
                role_type,
            },
            created_at: Utc::now(),
        };

        let stored = self
            .invitation_repository
            .insert(&invitation)
            .await
            .map_err(Self::map_repository_error)?;

        debug!(
            invitation = %stored.id,
            organization = %organization_id,
            role = %role_type,
            "Created organization invitation"
        );
        Ok(stored)
    }

    async fn get_by_code(&self, code: &str) -> Result<Invitation, InvitationError> {
        self.invitation_repository
            .get_by_code(code)
            .await
            .map_err(Self::map_repository_error)?
            .ok_or(InvitationError::NotFoundOrExpired)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Invitation>, InvitationError> {
        self.invitation_repository
            .get_by_id(id)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn accept(&self, code: &str, user_id: UserId) -> Result<(), InvitationError> {
        let invitation = self.get_by_code(code).await?;

        match invitation.grant.clone() {
            InvitationGrant::ProjectPermission {
                project_id,
                permission_type,
            } => {
                self.accept_project_grant(project_id, permission_type, user_id.clone())
                    .await?
            }
            InvitationGrant::OrganizationRole {
                organization_id,
                role_type,
            } => {
                self.accept_organization_grant(organization_id, role_type, user_id.clone())
                    .await?
            }
        }

        // The grant now belongs to the user; the invitation row is
        // independent of it and can simply go away.
        self.invitation_repository
            .delete(invitation.id)
            .await
            .map_err(Self::map_repository_error)?;

        debug!(invitation = %invitation.id, user = %user_id, "Accepted invitation");
        Ok(())
    }

    async fn accept_with_current_user(&self, code: &str) -> Result<(), InvitationError> {
        let user_id = self.authentication.current_user().await.map_err(|e| match e {
            AuthError::Unauthenticated => InvitationError::Unauthenticated,
            AuthError::InternalError(msg) => InvitationError::InternalError(msg),
        })?;
        self.accept(code, user_id).await
    }

    async fn remove_expired(&self) -> Result<u64, InvitationError> {
        let cutoff = Utc::now() - Duration::days(INVITATION_EXPIRY_DAYS);
        let removed = self
            .invitation_repository
            .delete_created_before(cutoff)
            .await
            .map_err(Self::map_repository_error)?;

        if removed > 0 {
            debug!(removed, "Removed expired invitations");
        }
        Ok(removed)
    }

    async fn delete(&self, invitation: &Invitation) -> Result<(), InvitationError> {
        match &invitation.grant {
            InvitationGrant::ProjectPermission {
                project_id,
                permission_type,
            } => {
                debug!(
                    invitation = %invitation.id,
                    project = %project_id,
                    r#type = %permission_type,
                    "Revoking pending project invitation"
                );
            }
            InvitationGrant::OrganizationRole {
                organization_id,
                role_type,
            } => {
                debug!(
                    invitation = %invitation.id,
                    organization = %organization_id,
                    role = %role_type,
                    "Revoking pending organization invitation"
                );
            }
        }

        let deleted = self
            .invitation_repository
            .delete(invitation.id)
            .await
            .map_err(Self::map_repository_error)?;

        if !deleted {
            return Err(InvitationError::NotFoundOrExpired);
        }
        Ok(())
    }

    async fn list_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Invitation>, InvitationError> {
        self.invitation_repository
            .list_by_project(project_id.0)
            .await
            .map_err(Self::map_repository_error)
    }

    async fn list_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Invitation>, InvitationError> {
        self.invitation_repository
            .list_by_organization(organization_id.0)
            .await
            .map_err(Self::map_repository_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organization::OrganizationRoleServiceImpl;
    use crate::permission::PermissionServiceImpl;
    use crate::test_utils::{
        InMemoryInvitationRepository, InMemoryOrganizationRoleRepository,
        InMemoryPermissionRepository, StaticAuthenticationFacade,
    };

    struct Fixture {
        service: InvitationServiceImpl,
        invitations: Arc<InMemoryInvitationRepository>,
        permissions: Arc<dyn PermissionServiceTrait>,
        roles: Arc<dyn OrganizationRoleServiceTrait>,
    }

    fn fixture() -> Fixture {
        fixture_with_user(None)
    }

    fn fixture_with_user(current_user: Option<UserId>) -> Fixture {
        let invitations = Arc::new(InMemoryInvitationRepository::new());
        let permissions: Arc<dyn PermissionServiceTrait> = Arc::new(PermissionServiceImpl::new(
            Arc::new(InMemoryPermissionRepository::new()),
        ));
        let roles: Arc<dyn OrganizationRoleServiceTrait> = Arc::new(
            OrganizationRoleServiceImpl::new(Arc::new(InMemoryOrganizationRoleRepository::new())),
        );
        let service = InvitationServiceImpl::new(
            invitations.clone(),
            permissions.clone(),
            roles.clone(),
            Arc::new(StaticAuthenticationFacade::new(current_user)),
        );
        Fixture {
            service,
            invitations,
            permissions,
            roles,
        }
    }

    #[tokio::test]
    async fn project_code_is_fifty_alphabetic_characters() {
        let f = fixture();
        let project = ProjectId(Uuid::new_v4());

        let code = f
            .service
            .create_for_project(project.clone(), PermissionType::Translate)
            .await
            .unwrap();

        assert_eq!(code.len(), INVITATION_CODE_LENGTH);
        assert!(code.chars().all(|c| c.is_ascii_alphabetic()));

        let invitation = f.service.get_by_code(&code).await.unwrap();
        assert_eq!(
            invitation.grant,
            InvitationGrant::ProjectPermission {
                project_id: project,
                permission_type: PermissionType::Translate,
            }
        );
    }

    #[tokio::test]
    async fn organization_invitation_carries_role_grant() {
        let f = fixture();
        let org = OrganizationId(Uuid::new_v4());

        let invitation = f
            .service
            .create_for_organization(org.clone(), OrganizationRoleType::Owner)
            .await
            .unwrap();

        assert_eq!(invitation.code.len(), INVITATION_CODE_LENGTH);
        assert_eq!(
            invitation.grant,
            InvitationGrant::OrganizationRole {
                organization_id: org,
                role_type: OrganizationRoleType::Owner,
            }
        );

        let resolved = f.service.get_by_code(&invitation.code).await.unwrap();
        assert_eq!(resolved, invitation);
    }

    #[tokio::test]
    async fn unknown_code_is_not_found_or_expired() {
        let f = fixture();
        let err = f.service.get_by_code("nosuchcode").await.unwrap_err();
        assert!(matches!(err, InvitationError::NotFoundOrExpired));
    }

    #[tokio::test]
    async fn accept_project_invitation_grants_permission_and_consumes_code() {
        let f = fixture();
        let project = ProjectId(Uuid::new_v4());
        let user = UserId(Uuid::new_v4());

        let code = f
            .service
            .create_for_project(project.clone(), PermissionType::Edit)
            .await
            .unwrap();

        f.service.accept(&code, user.clone()).await.unwrap();

        let granted = f
            .permissions
            .get_by_project_and_user(project, user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(granted.permission_type, PermissionType::Edit);

        let err = f.service.get_by_code(&code).await.unwrap_err();
        assert!(matches!(err, InvitationError::NotFoundOrExpired));
    }

    #[tokio::test]
    async fn accepted_code_cannot_be_reused() {
        let f = fixture();
        let project = ProjectId(Uuid::new_v4());

        let code = f
            .service
            .create_for_project(project, PermissionType::View)
            .await
            .unwrap();

        f.service
            .accept(&code, UserId(Uuid::new_v4()))
            .await
            .unwrap();

        let err = f
            .service
            .accept(&code, UserId(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, InvitationError::NotFoundOrExpired));
    }

    #[tokio::test]
    async fn accept_rejected_when_user_already_has_permission() {
        let f = fixture();
        let project = ProjectId(Uuid::new_v4());
        let user = UserId(Uuid::new_v4());

        f.permissions
            .grant(project.clone(), user.clone(), PermissionType::View)
            .await
            .unwrap();

        let code = f
            .service
            .create_for_project(project.clone(), PermissionType::Manage)
            .await
            .unwrap();

        let err = f.service.accept(&code, user.clone()).await.unwrap_err();
        assert!(matches!(err, InvitationError::AlreadyHasPermission));

        // No state change: the original permission is intact and the
        // invitation still resolves.
        let existing = f
            .permissions
            .get_by_project_and_user(project, user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(existing.permission_type, PermissionType::View);
        assert!(f.service.get_by_code(&code).await.is_ok());
    }

    #[tokio::test]
    async fn accept_organization_invitation_grants_role() {
        let f = fixture();
        let org = OrganizationId(Uuid::new_v4());
        let user = UserId(Uuid::new_v4());

        let invitation = f
            .service
            .create_for_organization(org.clone(), OrganizationRoleType::Member)
            .await
            .unwrap();

        f.service.accept(&invitation.code, user.clone()).await.unwrap();

        assert!(f.roles.is_member_or_owner(org, user).await.unwrap());
        let err = f.service.get_by_code(&invitation.code).await.unwrap_err();
        assert!(matches!(err, InvitationError::NotFoundOrExpired));
    }

    #[tokio::test]
    async fn accept_rejected_when_user_already_has_role() {
        let f = fixture();
        let org = OrganizationId(Uuid::new_v4());
        let user = UserId(Uuid::new_v4());

        f.roles
            .grant(org.clone(), user.clone(), OrganizationRoleType::Member)
            .await
            .unwrap();

        let invitation = f
            .service
            .create_for_organization(org, OrganizationRoleType::Owner)
            .await
            .unwrap();

        let err = f
            .service
            .accept(&invitation.code, user)
            .await
            .unwrap_err();
        assert!(matches!(err, InvitationError::AlreadyHasRole));
        assert!(f.service.get_by_code(&invitation.code).await.is_ok());
    }

    #[tokio::test]
    async fn accept_with_current_user_resolves_identity() {
        let user = UserId(Uuid::new_v4());
        let f = fixture_with_user(Some(user.clone()));
        let project = ProjectId(Uuid::new_v4());

        let code = f
            .service
            .create_for_project(project.clone(), PermissionType::Translate)
            .await
            .unwrap();

        f.service.accept_with_current_user(&code).await.unwrap();

        assert!(f
            .permissions
            .get_by_project_and_user(project, user)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn accept_without_authenticated_user_fails() {
        let f = fixture();
        let code = f
            .service
            .create_for_project(ProjectId(Uuid::new_v4()), PermissionType::View)
            .await
            .unwrap();

        let err = f.service.accept_with_current_user(&code).await.unwrap_err();
        assert!(matches!(err, InvitationError::Unauthenticated));
    }

    #[tokio::test]
    async fn remove_expired_respects_thirty_day_boundary() {
        let f = fixture();
        let now = Utc::now();

        let fresh = Invitation {
            id: Uuid::new_v4(),
            code: "A".repeat(INVITATION_CODE_LENGTH),
            grant: InvitationGrant::ProjectPermission {
                project_id: ProjectId(Uuid::new_v4()),
                permission_type: PermissionType::View,
            },
            created_at: now - Duration::days(29) - Duration::hours(23),
        };
        let stale = Invitation {
            id: Uuid::new_v4(),
            code: "B".repeat(INVITATION_CODE_LENGTH),
            grant: InvitationGrant::OrganizationRole {
                organization_id: OrganizationId(Uuid::new_v4()),
                role_type: OrganizationRoleType::Member,
            },
            created_at: now - Duration::days(30) - Duration::hours(1),
        };
        f.invitations.insert(&fresh).await.unwrap();
        f.invitations.insert(&stale).await.unwrap();

        let removed = f.service.remove_expired().await.unwrap();
        assert_eq!(removed, 1);

        assert!(f.service.get_by_code(&fresh.code).await.is_ok());
        let err = f.service.get_by_code(&stale.code).await.unwrap_err();
        assert!(matches!(err, InvitationError::NotFoundOrExpired));

        // Running the sweep again is a no-op.
        assert_eq!(f.service.remove_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_revokes_both_grant_kinds() {
        let f = fixture();

        let code = f
            .service
            .create_for_project(ProjectId(Uuid::new_v4()), PermissionType::Manage)
            .await
            .unwrap();
        let project_invitation = f.service.get_by_code(&code).await.unwrap();
        f.service.delete(&project_invitation).await.unwrap();
        assert!(matches!(
            f.service.get_by_code(&code).await.unwrap_err(),
            InvitationError::NotFoundOrExpired
        ));

        let org_invitation = f
            .service
            .create_for_organization(OrganizationId(Uuid::new_v4()), OrganizationRoleType::Member)
            .await
            .unwrap();
        f.service.delete(&org_invitation).await.unwrap();
        assert!(matches!(
            f.service.get_by_code(&org_invitation.code).await.unwrap_err(),
            InvitationError::NotFoundOrExpired
        ));

        // Deleting twice reports the record as gone.
        assert!(matches!(
            f.service.delete(&org_invitation).await.unwrap_err(),
            InvitationError::NotFoundOrExpired
        ));
    }

    #[tokio::test]
    async fn listings_are_scoped_and_ordered_by_creation() {
        let f = fixture();
        let project = ProjectId(Uuid::new_v4());
        let org = OrganizationId(Uuid::new_v4());

        let first = f
            .service
            .create_for_project(project.clone(), PermissionType::View)
            .await
            .unwrap();
        let second = f
            .service
            .create_for_project(project.clone(), PermissionType::Edit)
            .await
            .unwrap();
        f.service
            .create_for_organization(org.clone(), OrganizationRoleType::Member)
            .await
            .unwrap();

        let for_project = f.service.list_for_project(project).await.unwrap();
        assert_eq!(for_project.len(), 2);
        assert_eq!(for_project[0].code, first);
        assert_eq!(for_project[1].code, second);

        let for_org = f.service.list_for_organization(org).await.unwrap();
        assert_eq!(for_org.len(), 1);

        let unrelated = f
            .service
            .list_for_project(ProjectId(Uuid::new_v4()))
            .await
            .unwrap();
        assert!(unrelated.is_empty());
    }

    #[tokio::test]
    async fn find_by_id_round_trip() {
        let f = fixture();
        let invitation = f
            .service
            .create_for_organization(OrganizationId(Uuid::new_v4()), OrganizationRoleType::Owner)
            .await
            .unwrap();

        let found = f.service.find_by_id(invitation.id).await.unwrap().unwrap();
        assert_eq!(found, invitation);
        assert!(f.service.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_storage_surfaces_as_invariant_violation() {
        let f = fixture();
        f.invitations.poison_next_read();

        let err = f.service.get_by_code("whatever").await.unwrap_err();
        assert!(matches!(err, InvitationError::InvariantViolation(_)));
    }
}
