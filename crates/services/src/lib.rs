pub mod auth;
pub mod common;
pub mod invitation;
pub mod organization;
pub mod permission;
pub mod project;

pub use auth::UserId;
pub use invitation::InvitationServiceImpl;
pub use organization::OrganizationRoleServiceImpl;
pub use permission::PermissionServiceImpl;
pub use project::ProjectServiceImpl;

#[cfg(test)]
mod test_utils;
