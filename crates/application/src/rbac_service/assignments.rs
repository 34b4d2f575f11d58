use super::*;

impl RbacService {
    /// Lists every stored assignment, local and remote.
    pub async fn list_role_assignments(&self) -> AppResult<Vec<UserRoleAssignment>> {
        self.repository.list_role_assignments().await
    }

    /// Lists a user's assignments. Remote ones are included on request.
    pub async fn get_role_assignments_for_user(
        &self,
        user: &User,
        include_remote: bool,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        self.repository
            .list_role_assignments_for_user(user.name(), include_remote)
            .await
    }

    /// Assigns an existing role to a user. Repeated calls are no-ops.
    pub async fn assign_role_to_user(
        &self,
        role: &str,
        user: &User,
        source: &str,
        description: Option<String>,
        is_remote: bool,
    ) -> AppResult<UserRoleAssignment> {
        self.get_role_by_name(role).await?;

        let assignment = UserRoleAssignment::new(user.name(), role, source, description, is_remote)?;
        let inserted = self
            .repository
            .upsert_role_assignment(assignment.clone())
            .await?;

        if inserted {
            debug!(
                user = %user.name(),
                role = %role,
                source = %source,
                is_remote,
                "assigned role to user"
            );
        }
        Ok(assignment)
    }

    /// Revokes the assignment keyed by (user, role, source).
    pub async fn revoke_role_from_user(
        &self,
        role: &str,
        user: &User,
        source: &str,
    ) -> AppResult<bool> {
        let removed = self
            .repository
            .delete_role_assignment(user.name(), role, source)
            .await?;

        if removed {
            debug!(user = %user.name(), role = %role, source = %source, "revoked role from user");
        }
        Ok(removed)
    }

    /// Fails with a configuration error naming every role that does not exist.
    pub async fn validate_roles_exist(&self, role_names: &[String]) -> AppResult<()> {
        let mut missing = Vec::new();
        for role_name in role_names {
            if self.repository.find_role(role_name).await?.is_none() {
                missing.push(role_name.as_str());
            }
        }

        if missing.is_empty() {
            return Ok(());
        }

        Err(AppError::Configuration(format!(
            "referenced roles do not exist: {}",
            missing.join(", ")
        )))
    }
}
