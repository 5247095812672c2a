pub mod invitation;
pub mod organization_role;
pub mod permission;
pub mod project;
pub mod retry;
pub mod utils;

pub use invitation::PgInvitationRepository;
pub use organization_role::PgOrganizationRoleRepository;
pub use permission::PgPermissionRepository;
pub use project::PgProjectRepository;
