use super::*;

impl AuthorizationService {
    /// Returns whether the user holds `role`. Always true with RBAC off.
    pub async fn user_has_role(&self, user: &User, role: &str) -> AppResult<bool> {
        if !self.config.enable {
            return Ok(true);
        }

        let roles = self.service.role_names_for_user(user).await?;
        Ok(roles.iter().any(|name| name == role))
    }

    /// Returns whether the user holds any reserved role. Always true with RBAC off.
    pub async fn user_has_system_role(&self, user: &User) -> AppResult<bool> {
        if !self.config.enable {
            return Ok(true);
        }

        let roles = self.service.role_names_for_user(user).await?;
        Ok(roles
            .iter()
            .any(|name| SystemRole::from_name(name).is_some()))
    }

    /// Returns whether the user is a system administrator.
    pub async fn user_is_system_admin(&self, user: &User) -> AppResult<bool> {
        self.user_has_role(user, SystemRole::SystemAdmin.as_str())
            .await
    }

    /// Returns whether the user is an administrator. System administrators
    /// are checked first.
    pub async fn user_is_admin(&self, user: &User) -> AppResult<bool> {
        if self.user_is_system_admin(user).await? {
            return Ok(true);
        }

        self.user_has_role(user, SystemRole::Admin.as_str()).await
    }

    /// Fails unless the user is an administrator.
    pub async fn assert_user_is_admin(&self, user: &User) -> AppResult<()> {
        if self.user_is_admin(user).await? {
            return Ok(());
        }

        Err(Self::access_denied(user, "Administrator access required"))
    }

    /// Fails unless the user is a system administrator.
    pub async fn assert_user_is_system_admin(&self, user: &User) -> AppResult<()> {
        if self.user_is_system_admin(user).await? {
            return Ok(());
        }

        Err(Self::access_denied(user, "System Administrator access required"))
    }

    /// Fails unless the user is an administrator or `target_user` is the
    /// user's own name.
    pub async fn assert_user_is_admin_or_operating_on_own_resource(
        &self,
        user: &User,
        target_user: Option<&str>,
    ) -> AppResult<()> {
        if !self.config.enable {
            return Ok(());
        }

        if target_user == Some(user.name()) || self.user_is_admin(user).await? {
            return Ok(());
        }

        Err(Self::access_denied(user, "Administrator or self access required"))
    }

    /// Guards the `user` impersonation parameter.
    ///
    /// Acting as oneself is always allowed. Acting as someone else requires an
    /// administrator, and with `require_rbac_enabled` also requires RBAC on.
    pub async fn assert_user_is_admin_if_user_query_param_is_provided(
        &self,
        user: &User,
        user_param: Option<&str>,
        require_rbac_enabled: bool,
    ) -> AppResult<()> {
        let Some(user_param) = user_param else {
            return Ok(());
        };
        if user_param == user.name() {
            return Ok(());
        }

        if require_rbac_enabled && !self.config.enable {
            return Err(Self::access_denied(
                user,
                "\"user\" attribute can only be provided by admins when RBAC is enabled",
            ));
        }

        if !self.user_is_admin(user).await? {
            return Err(Self::access_denied(
                user,
                "\"user\" attribute can only be provided by admins",
            ));
        }

        Ok(())
    }

    /// Returns the user's RBAC standing as seen by policy checks.
    pub async fn rbac_summary(&self, user: &User) -> AppResult<RbacSummary> {
        let mut summary = self
            .service
            .rbac_summary_for_user(user, self.config.enable)
            .await?;
        summary.is_admin = self.user_is_admin(user).await?;
        Ok(summary)
    }
}
