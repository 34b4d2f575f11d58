use super::*;

impl RbacService {
    /// Lists every role ordered by name.
    pub async fn get_all_roles(&self) -> AppResult<Vec<Role>> {
        self.repository.list_roles().await
    }

    /// Lists the reserved roles present in the store.
    pub async fn get_system_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self
            .repository
            .list_roles()
            .await?
            .into_iter()
            .filter(Role::is_system)
            .collect())
    }

    /// Returns a role by name.
    pub async fn get_role_by_name(&self, name: &str) -> AppResult<Role> {
        self.repository
            .find_role(name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{name}' does not exist")))
    }

    /// Persists a grant.
    pub async fn create_permission_grant(
        &self,
        input: PermissionGrantInput,
    ) -> AppResult<PermissionGrant> {
        self.repository.create_permission_grant(input).await
    }

    /// Creates a role together with its grants.
    ///
    /// Grant inputs are validated on construction; reserved names are refused
    /// for non-system roles.
    pub async fn create_role(
        &self,
        name: &str,
        description: Option<String>,
        grants: Vec<PermissionGrantInput>,
        is_system: bool,
    ) -> AppResult<Role> {
        if !is_system && SystemRole::from_name(name).is_some() {
            return Err(AppError::Configuration(format!(
                "role name '{name}' is reserved for a system role"
            )));
        }

        if self.repository.find_role(name).await?.is_some() {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let mut grant_ids = Vec::with_capacity(grants.len());
        for input in grants {
            let grant = self.repository.create_permission_grant(input).await?;
            grant_ids.push(grant.id().to_owned());
        }

        let role = Role::new(name, description, grant_ids, is_system)?;
        self.repository.save_role(role.clone()).await?;

        info!(
            role = %role.name(),
            grant_count = role.permission_grant_ids().len(),
            "created rbac role"
        );
        Ok(role)
    }

    /// Deletes a non-system role and its grants.
    pub async fn delete_role(&self, name: &str) -> AppResult<()> {
        let role = self.get_role_by_name(name).await?;
        if role.is_system() {
            return Err(AppError::Validation(format!(
                "system role '{name}' can't be deleted"
            )));
        }

        self.repository
            .delete_permission_grants(role.permission_grant_ids())
            .await?;
        self.repository.delete_role(name).await?;

        info!(role = %name, "deleted rbac role");
        Ok(())
    }

    /// Creates the reserved roles that are absent. Returns the created ones.
    pub async fn insert_system_roles(&self) -> AppResult<Vec<Role>> {
        let mut created = Vec::new();
        for system_role in SystemRole::all() {
            if self
                .repository
                .find_role(system_role.as_str())
                .await?
                .is_some()
            {
                continue;
            }

            let role = Role::system(*system_role)?;
            self.repository.save_role(role.clone()).await?;
            created.push(role);
        }

        if !created.is_empty() {
            info!(created = created.len(), "inserted system roles");
        }
        Ok(created)
    }

    /// Returns the roles assigned to a user, in assignment order.
    ///
    /// Assignments referencing deleted roles are skipped.
    pub async fn get_roles_for_user(
        &self,
        user: &User,
        include_remote: bool,
    ) -> AppResult<Vec<Role>> {
        let assignments = self
            .repository
            .list_role_assignments_for_user(user.name(), include_remote)
            .await?;

        let mut role_names: Vec<&str> = Vec::with_capacity(assignments.len());
        for assignment in &assignments {
            if !role_names.contains(&assignment.role()) {
                role_names.push(assignment.role());
            }
        }

        let mut roles = Vec::with_capacity(role_names.len());
        for role_name in role_names {
            if let Some(role) = self.repository.find_role(role_name).await? {
                roles.push(role);
            }
        }

        Ok(roles)
    }

    /// Returns the names of every local and remote role held by a user.
    pub async fn role_names_for_user(&self, user: &User) -> AppResult<Vec<String>> {
        Ok(self
            .get_roles_for_user(user, true)
            .await?
            .into_iter()
            .map(|role| role.name().to_owned())
            .collect())
    }

    /// Returns every grant reachable through the user's roles.
    ///
    /// When `permission_type` is set only grants covering it are returned.
    pub async fn get_all_permission_grants_for_user(
        &self,
        user: &User,
        permission_type: Option<PermissionType>,
    ) -> AppResult<Vec<PermissionGrant>> {
        let roles = self.get_roles_for_user(user, true).await?;

        let mut grant_ids: Vec<String> = Vec::new();
        for role in &roles {
            for grant_id in role.permission_grant_ids() {
                if !grant_ids.contains(grant_id) {
                    grant_ids.push(grant_id.clone());
                }
            }
        }

        if grant_ids.is_empty() {
            return Ok(Vec::new());
        }

        let grants = self.repository.find_permission_grants(&grant_ids).await?;
        Ok(match permission_type {
            Some(permission_type) => grants
                .into_iter()
                .filter(|grant| grant.covers(permission_type))
                .collect(),
            None => grants,
        })
    }

    /// Summarises a user's standing from stored roles.
    pub async fn rbac_summary_for_user(&self, user: &User, enabled: bool) -> AppResult<RbacSummary> {
        let roles = self.role_names_for_user(user).await?;
        let is_admin = roles.iter().any(|role| {
            role == SystemRole::SystemAdmin.as_str() || role == SystemRole::Admin.as_str()
        });

        Ok(RbacSummary {
            enabled,
            is_admin,
            roles,
        })
    }
}
