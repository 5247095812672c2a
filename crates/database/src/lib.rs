pub mod migrations;
pub mod models;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, DbPool};
pub use repositories::{
    PgInvitationRepository, PgOrganizationRoleRepository, PgPermissionRepository,
    PgProjectRepository,
};

use anyhow::Result;

/// Database service combining all repositories
pub struct Database {
    pub projects: PgProjectRepository,
    pub permissions: PgPermissionRepository,
    pub organization_roles: PgOrganizationRoleRepository,
    pub invitations: PgInvitationRepository,
    pool: DbPool,
}

impl Database {
    /// Create a new database service from a connection pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            projects: PgProjectRepository::new(pool.clone()),
            permissions: PgPermissionRepository::new(pool.clone()),
            organization_roles: PgOrganizationRoleRepository::new(pool.clone()),
            invitations: PgInvitationRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new database service from configuration
    pub async fn from_config(config: &config::DatabaseConfig) -> Result<Self> {
        let pool = create_pool(config).await?;
        Ok(Self::new(pool))
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run(&self.pool).await
    }
}
