use std::sync::Arc;

use tracing::{debug, info};
use warrant_core::{AppError, AppResult};
use warrant_domain::{
    GroupToRoleMapping, PermissionGrant, PermissionGrantInput, PermissionType, RbacSummary, Role,
    SystemRole, User, UserRoleAssignment,
};

use crate::RbacRepository;

mod assignments;
mod group_maps;
mod roles;


/// Application service for role, grant, assignment and group mapping state.
#[derive(Clone)]
pub struct RbacService {
    repository: Arc<dyn RbacRepository>,
}

impl RbacService {
    /// Creates a new service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn RbacRepository>) -> Self {
        Self { repository }
    }

    /// Returns the user record, creating it when absent.
    pub async fn ensure_user(&self, name: &str) -> AppResult<User> {
        if let Some(user) = self.repository.find_user(name).await? {
            return Ok(user);
        }

        let user = User::new(name)?;
        self.repository.save_user(user.clone()).await?;
        debug!(user = %name, "created rbac user record");
        Ok(user)
    }
}
