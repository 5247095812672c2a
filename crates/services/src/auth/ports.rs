use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Domain ID types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        UserId(uuid)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No authenticated user in the current context")]
    Unauthenticated,

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Resolves the user behind the current request. Session handling lives
/// outside this crate; services only consume the resolved identity.
#[async_trait]
pub trait AuthenticationFacade: Send + Sync {
    async fn current_user(&self) -> Result<UserId, AuthError>;
}
